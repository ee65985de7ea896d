//! CLI argument definitions for helpdesk.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{CommentType, Priority, Profile, Status};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("HELPDESK_GIT_COMMIT"),
    ", built ",
    env!("HELPDESK_BUILD_TIMESTAMP"),
    ")"
);

/// Helpdesk - support tickets for end users, technicians and administrators.
///
/// Start with `helpdesk init` to create the database, then act as a user with `--as <id>`.
#[derive(Parser, Debug)]
#[command(name = "helpdesk")]
#[command(author, version, long_version = LONG_VERSION, about = "Support-ticket tracking from the command line", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Config file to read instead of ~/.config/helpdesk/helpdesk.kdl
    #[arg(long = "config", global = true, env = "HELPDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides HELPDESK_DB and the config file)
    #[arg(long = "db", global = true)]
    pub database: Option<PathBuf>,

    /// Id of the user to act as (overrides HELPDESK_USER and default-user)
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    pub acting_user: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and seed an administrator when it is empty
    Init,

    /// Ticket commands
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// User administration (administrators only for changes)
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Category administration (administrators only for changes)
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Ticket counts and mean resolution time
    Stats,

    /// Write tickets, users and categories as JSON files
    Export {
        /// Target directory (overrides HELPDESK_EXPORT_DIR and export-dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Ticket subcommands
#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// File a new ticket
    Create {
        /// Short summary
        title: String,

        /// What is wrong
        #[arg(short, long)]
        description: String,

        /// Category id
        #[arg(short, long)]
        category: String,
    },

    /// Show a ticket with its comments, tags and attachments
    Show {
        /// Ticket id
        id: String,
    },

    /// List visible tickets
    List {
        /// Only this status (ABERTO, EM_ANDAMENTO, RESOLVIDO, FECHADO)
        #[arg(short, long)]
        status: Option<Status>,

        /// Only this priority (BAIXA, MEDIA, ALTA, CRITICA)
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Search visible tickets by title, description or code
    Search {
        /// Substring to look for
        term: String,
    },

    /// Move a ticket to another status
    Status {
        /// Ticket id
        id: String,

        /// New status (ABERTO, EM_ANDAMENTO, RESOLVIDO, FECHADO)
        status: Status,
    },

    /// Set the responsible technician
    Assign {
        /// Ticket id
        id: String,

        /// User id of the new responsible
        user: String,
    },

    /// Add a comment
    Comment {
        /// Ticket id
        id: String,

        /// Comment text
        content: String,

        /// Comment type (COMENTARIO, RESOLUCAO, INTERNO)
        #[arg(short = 't', long = "type", default_value = "COMENTARIO")]
        kind: CommentType,
    },

    /// Attach a tag
    Tag {
        /// Ticket id
        id: String,

        tag: String,
    },

    /// Record an attachment reference
    Attach {
        /// Ticket id
        id: String,

        /// Attachment identifier
        attachment: String,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List all users
    List,

    /// Register a user
    Add {
        name: String,

        email: String,

        /// Profile (USUARIO, TECNICO, ADMIN)
        #[arg(short, long, default_value = "USUARIO")]
        profile: Profile,

        /// Department id
        #[arg(short, long, default_value_t = 1)]
        department: i64,
    },

    /// Deactivate a user
    Deactivate {
        /// User id
        id: String,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List active categories
    List,

    /// Create a category
    Add {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Hex colour shown next to the name
        #[arg(long, default_value = "#45b7d1")]
        colour: String,
    },

    /// Deactivate a category
    Deactivate {
        /// Category id
        id: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings and where each came from
    Show,
}
