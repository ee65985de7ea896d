//! The help desk domain layer.
//!
//! [`HelpDesk`] is what embedding applications call. It validates input,
//! checks the acting principal against the access rules, and drives the
//! store. Writes return an [`Outcome`]; reads return entities, falling back to
//! an empty collection or `None` when the store fails. Nothing here panics or
//! returns an error across the boundary.

use chrono::Utc;

use crate::models::{
    Category, CommentType, NewComment, NewTicket, Priority, Status, Ticket, TicketDetails, User,
};
use crate::outcome::{Action, Outcome, Target};
use crate::storage::{Storage, TicketQuery, TicketStatistics, parse_id};
use crate::{Error, Result};

/// Ticket operations on behalf of one acting principal.
pub struct HelpDesk {
    storage: Storage,
    principal: Option<User>,
}

impl HelpDesk {
    /// Wrap an open store. No principal is signed in yet.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            principal: None,
        }
    }

    /// Use an already-resolved principal.
    pub fn with_principal(mut self, user: User) -> Self {
        self.principal = Some(user);
        self
    }

    /// Load the user with this id and make them the acting principal.
    pub fn sign_in(&mut self, user_id: i64) -> Result<&User> {
        let user = self
            .storage
            .get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", user_id)))?;
        if !user.active {
            return Err(Error::InvalidInput(format!("User {} is inactive", user_id)));
        }
        tracing::debug!(user_id, profile = %user.profile, "principal signed in");
        Ok(&*self.principal.insert(user))
    }

    pub fn sign_out(&mut self) {
        self.principal = None;
    }

    pub fn principal(&self) -> Option<&User> {
        self.principal.as_ref()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Direct store access for administrative tasks (users, categories).
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    // === Writes ===

    /// File a new ticket as the acting principal. It starts OPEN with MEDIUM priority.
    pub fn create_ticket(&mut self, title: &str, description: &str, category_id: &str) -> Outcome {
        let action = Action::CreateTicket;
        let Some(requester_id) = self.principal.as_ref().map(|u| u.id) else {
            return Outcome::Unauthenticated;
        };
        if title.trim().is_empty() || description.trim().is_empty() {
            return Outcome::invalid("Título e descrição são obrigatórios");
        }
        let category_id = match parse_id(category_id) {
            Ok(id) => id,
            Err(_) => {
                return Outcome::invalid(format!("ID de categoria inválido: {}", category_id));
            }
        };
        match self.storage.get_category(category_id) {
            Ok(Some(category)) if category.active => {}
            Ok(_) => return Outcome::not_found(Target::Category),
            Err(e) => return store_failure(action, e),
        }

        let ticket = NewTicket {
            title: title.to_string(),
            description: description.to_string(),
            category_id,
            requester_id,
            priority: Priority::Medium,
            created_at: Utc::now(),
        };
        match self.storage.insert_ticket(&ticket) {
            Ok(id) => {
                tracing::info!(ticket_id = id, requester_id, "ticket created");
                Outcome::Created { id }
            }
            Err(e) => store_failure(action, e),
        }
    }

    /// Move a ticket to `status`. Requires edit rights and a legal transition.
    pub fn update_status(&mut self, ticket_id: &str, status: Status) -> Outcome {
        let action = Action::UpdateStatus;
        let Some(principal) = self.principal.as_ref() else {
            return Outcome::Unauthenticated;
        };
        let id = match parse_ticket_id(ticket_id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let ticket = match self.storage.get_ticket(id) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Outcome::not_found(Target::Ticket),
            Err(e) => return store_failure(action, e),
        };
        if !principal.can_edit(&ticket) {
            return Outcome::forbidden(action);
        }
        if !ticket.status.can_transition_to(status, principal.profile) {
            return Outcome::invalid(format!(
                "Transição de status inválida: de {} para {}",
                ticket.status.display_name(),
                status.display_name()
            ));
        }

        match self.storage.update_status(id, status, Utc::now()) {
            Ok(true) => {
                tracing::info!(
                    ticket_id = id,
                    from = %ticket.status,
                    to = %status,
                    "status updated"
                );
                Outcome::done(action)
            }
            Ok(false) => Outcome::not_found(Target::Ticket),
            Err(e) => store_failure(action, e),
        }
    }

    /// Make `user_id` responsible for the ticket. The responsible must be a
    /// technician or an administrator. An OPEN ticket moves to IN_PROGRESS;
    /// an existing responsible is replaced.
    pub fn assign_responsible(&mut self, ticket_id: &str, user_id: &str) -> Outcome {
        let action = Action::AssignResponsible;
        let Some(principal) = self.principal.as_ref() else {
            return Outcome::Unauthenticated;
        };
        if !principal.can_assume() {
            return Outcome::forbidden(action);
        }
        let id = match parse_ticket_id(ticket_id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let assignee_id = match parse_id(user_id) {
            Ok(id) => id,
            Err(_) => return Outcome::invalid(format!("ID de usuário inválido: {}", user_id)),
        };
        match self.storage.get_user(assignee_id) {
            Ok(Some(user)) if user.active && user.profile.is_privileged() => {}
            Ok(Some(user)) if user.active => {
                return Outcome::invalid(format!(
                    "O responsável deve ser técnico ou administrador: {}",
                    user.name
                ));
            }
            Ok(_) => return Outcome::not_found(Target::User),
            Err(e) => return store_failure(action, e),
        }

        match self.storage.assign_responsible(id, assignee_id, Utc::now()) {
            Ok(true) => {
                tracing::info!(ticket_id = id, assignee_id, "responsible assigned");
                Outcome::done(action)
            }
            Ok(false) => Outcome::not_found(Target::Ticket),
            Err(e) => store_failure(action, e),
        }
    }

    /// Append a comment. A RESOLUTION comment is informational and does not
    /// change the ticket's status.
    pub fn add_comment(&mut self, ticket_id: &str, content: &str, kind: CommentType) -> Outcome {
        let action = Action::AddComment;
        let Some(author_id) = self.principal.as_ref().map(|u| u.id) else {
            return Outcome::Unauthenticated;
        };
        let id = match parse_ticket_id(ticket_id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        if content.trim().is_empty() {
            return Outcome::invalid("O conteúdo do comentário é obrigatório");
        }
        match self.storage.get_ticket(id) {
            Ok(Some(_)) => {}
            Ok(None) => return Outcome::not_found(Target::Ticket),
            Err(e) => return store_failure(action, e),
        }

        let comment = NewComment {
            ticket_id: id,
            author_id,
            content: content.to_string(),
            kind,
            created_at: Utc::now(),
        };
        match self.storage.insert_comment(&comment) {
            Ok(comment_id) => {
                tracing::info!(ticket_id = id, comment_id, kind = %kind, "comment added");
                Outcome::done(action)
            }
            Err(e) => store_failure(action, e),
        }
    }

    /// Tag a ticket. Re-adding an existing tag succeeds without change.
    pub fn add_tag(&mut self, ticket_id: &str, tag: &str) -> Outcome {
        let tag = tag.trim();
        self.edit_auxiliary(Action::AddTag, ticket_id, tag, |storage, id| {
            storage.add_tag(id, tag, Utc::now())
        })
    }

    /// Record an attachment identifier on a ticket.
    pub fn add_attachment(&mut self, ticket_id: &str, attachment_id: &str) -> Outcome {
        let attachment_id = attachment_id.trim();
        self.edit_auxiliary(Action::AddAttachment, ticket_id, attachment_id, |storage, id| {
            storage.add_attachment(id, attachment_id, Utc::now())
        })
    }

    /// Shared path for tag and attachment writes. `value` is the trimmed text
    /// being recorded.
    fn edit_auxiliary<F>(
        &mut self,
        action: Action,
        ticket_id: &str,
        value: &str,
        write: F,
    ) -> Outcome
    where
        F: FnOnce(&mut Storage, i64) -> Result<bool>,
    {
        let Some(principal) = self.principal.as_ref() else {
            return Outcome::Unauthenticated;
        };
        if value.is_empty() {
            return Outcome::invalid(match action {
                Action::AddAttachment => "O identificador do anexo é obrigatório",
                _ => "A tag não pode ser vazia",
            });
        }
        let id = match parse_ticket_id(ticket_id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let ticket = match self.storage.get_ticket(id) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Outcome::not_found(Target::Ticket),
            Err(e) => return store_failure(action, e),
        };
        if !principal.can_edit(&ticket) {
            return Outcome::forbidden(action);
        }
        match write(&mut self.storage, id) {
            Ok(added) => {
                tracing::info!(ticket_id = id, ?action, added, "ticket metadata updated");
                Outcome::done(action)
            }
            Err(e) => store_failure(action, e),
        }
    }

    // === Reads ===

    /// Look a ticket up by id. Not scoped: any principal may open a known id.
    pub fn get_ticket(&self, ticket_id: &str) -> Option<Ticket> {
        let id = parse_id(ticket_id).ok()?;
        self.storage.get_ticket(id).unwrap_or_else(|e| {
            tracing::warn!(ticket_id = id, error = %e, "ticket lookup failed");
            None
        })
    }

    /// A ticket with its comments, tags and attachments.
    pub fn ticket_details(&self, ticket_id: &str) -> Option<TicketDetails> {
        let ticket = self.get_ticket(ticket_id)?;
        let hydrate = || -> Result<TicketDetails> {
            Ok(TicketDetails {
                attachments: self.storage.list_attachments(ticket.id)?,
                tags: self.storage.list_tags(ticket.id)?,
                comments: self.storage.list_comments(ticket.id)?,
                ticket: ticket.clone(),
            })
        };
        hydrate()
            .map_err(|e| tracing::warn!(ticket_id = ticket.id, error = %e, "hydration failed"))
            .ok()
    }

    /// Every ticket the principal may see.
    pub fn list_tickets(&self) -> Vec<Ticket> {
        self.scoped(|query| query)
    }

    /// Tickets whose title, description or code contains `term`, ignoring
    /// case. A blank term lists everything in scope.
    pub fn search_tickets(&self, term: &str) -> Vec<Ticket> {
        self.scoped(|query| query.with_term(term))
    }

    pub fn filter_by_status(&self, status: Status) -> Vec<Ticket> {
        self.scoped(|query| query.with_status(status))
    }

    pub fn filter_by_priority(&self, priority: Priority) -> Vec<Ticket> {
        self.scoped(|query| query.with_priority(priority))
    }

    /// Tickets matching every filter given, in one scoped query.
    pub fn filter_tickets(
        &self,
        status: Option<Status>,
        priority: Option<Priority>,
    ) -> Vec<Ticket> {
        self.scoped(|query| TicketQuery {
            status,
            priority,
            ..query
        })
    }

    pub fn list_users(&self) -> Vec<User> {
        or_default("list users", self.storage.list_users())
    }

    /// Categories new tickets may be filed under.
    pub fn list_categories(&self) -> Vec<Category> {
        or_default("list categories", self.storage.list_active_categories())
    }

    pub fn statistics(&self) -> TicketStatistics {
        or_default("statistics", self.storage.statistics())
    }

    fn scoped(&self, refine: impl FnOnce(TicketQuery) -> TicketQuery) -> Vec<Ticket> {
        let Some(principal) = self.principal.as_ref() else {
            return Vec::new();
        };
        let query = refine(TicketQuery::new(principal.scope()));
        or_default("list tickets", self.storage.list_tickets(&query))
    }
}

fn parse_ticket_id(raw: &str) -> std::result::Result<i64, Outcome> {
    parse_id(raw).map_err(|_| Outcome::invalid(format!("ID de ticket inválido: {}", raw)))
}

fn store_failure(action: Action, err: Error) -> Outcome {
    tracing::warn!(?action, error = %err, "store rejected write");
    Outcome::store_error(action, &err)
}

fn or_default<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "{} failed", what);
        T::default()
    })
}
