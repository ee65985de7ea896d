//! Helpdesk CLI - support-ticket tracking from the command line.

use clap::Parser;
use helpdesk::cli::{
    CategoryCommands, Cli, Commands, ConfigCommands, TicketCommands, UserCommands,
};
use helpdesk::commands::{self, Output};
use helpdesk::config::{self, ConfigOverrides, DEFAULT_LOG_FILTER, ResolvedConfig};
use helpdesk::desk::HelpDesk;
use helpdesk::export;
use helpdesk::outcome::Outcome;
use helpdesk::storage::Storage;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    match run(cli) {
        Ok(true) => {}
        // The command ran but reported a failed outcome
        Ok(false) => process::exit(1),
        Err(e) => {
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            process::exit(1);
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_logging(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<bool, helpdesk::Error> {
    let human = cli.human_readable;

    let file_config = config::load_config(cli.config.as_deref())?;
    let mut overrides = ConfigOverrides::new();
    if let Some(path) = cli.database {
        overrides = overrides.with_database(path);
    }
    if let Some(user) = cli.acting_user {
        overrides = overrides.with_user(user);
    }
    if let Commands::Export { dir: Some(ref dir) } = cli.command {
        overrides = overrides.with_export_dir(dir.clone());
    }
    let resolved = config::resolve_config(&file_config, &overrides)?;

    init_logging(&resolved.log_filter.value);
    tracing::debug!(
        database = %resolved.database().display(),
        source = %resolved.database.source,
        "configuration resolved"
    );

    match cli.command {
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            output(&commands::config_show(&resolved), human);
            Ok(true)
        }
        Commands::Init => {
            let mut storage = Storage::open(resolved.database())?;
            output(&commands::init(&mut storage, resolved.database())?, human);
            Ok(true)
        }
        command => {
            let mut desk = HelpDesk::new(Storage::open(resolved.database())?);
            if let Some(user_id) = resolved.user() {
                desk.sign_in(user_id)?;
            }
            run_command(command, &mut desk, &resolved, human)
        }
    }
}

fn run_command(
    command: Commands,
    desk: &mut HelpDesk,
    resolved: &ResolvedConfig,
    human: bool,
) -> Result<bool, helpdesk::Error> {
    match command {
        Commands::Ticket { command } => match command {
            TicketCommands::Create {
                title,
                description,
                category,
            } => Ok(report(desk.create_ticket(&title, &description, &category), human)),
            TicketCommands::Show { id } => {
                output(&commands::ticket_show(desk, &id)?, human);
                Ok(true)
            }
            TicketCommands::List { status, priority } => {
                output(&commands::ticket_list(desk, status, priority), human);
                Ok(true)
            }
            TicketCommands::Search { term } => {
                output(&commands::ticket_search(desk, &term), human);
                Ok(true)
            }
            TicketCommands::Status { id, status } => {
                Ok(report(desk.update_status(&id, status), human))
            }
            TicketCommands::Assign { id, user } => {
                Ok(report(desk.assign_responsible(&id, &user), human))
            }
            TicketCommands::Comment { id, content, kind } => {
                Ok(report(desk.add_comment(&id, &content, kind), human))
            }
            TicketCommands::Tag { id, tag } => Ok(report(desk.add_tag(&id, &tag), human)),
            TicketCommands::Attach { id, attachment } => {
                Ok(report(desk.add_attachment(&id, &attachment), human))
            }
        },
        Commands::User { command } => {
            match command {
                UserCommands::List => output(&commands::user_list(desk), human),
                UserCommands::Add {
                    name,
                    email,
                    profile,
                    department,
                } => output(
                    &commands::user_add(desk, &name, &email, profile, department)?,
                    human,
                ),
                UserCommands::Deactivate { id } => {
                    output(&commands::user_deactivate(desk, &id)?, human)
                }
            }
            Ok(true)
        }
        Commands::Category { command } => {
            match command {
                CategoryCommands::List => output(&commands::category_list(desk), human),
                CategoryCommands::Add {
                    name,
                    description,
                    colour,
                } => output(
                    &commands::category_add(desk, &name, &description, &colour)?,
                    human,
                ),
                CategoryCommands::Deactivate { id } => {
                    output(&commands::category_deactivate(desk, &id)?, human)
                }
            }
            Ok(true)
        }
        Commands::Stats => {
            output(&desk.statistics(), human);
            Ok(true)
        }
        Commands::Export { .. } => {
            let snapshot = export::export_snapshot(desk, resolved.export_dir());
            output(&snapshot, human);
            Ok(snapshot.is_complete())
        }
        Commands::Init | Commands::Config { .. } => Ok(true),
    }
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Print an outcome and tell the caller whether it succeeded.
fn report(outcome: Outcome, human: bool) -> bool {
    output(&outcome, human);
    outcome.is_success()
}
