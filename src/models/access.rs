//! Authorization rules for tickets.
//!
//! Technicians and administrators may edit, assume and see every ticket. A
//! plain user may edit and see only the tickets they filed, and may never take
//! responsibility for one.

use super::{Ticket, User};

impl User {
    /// May this user change the given ticket's status or metadata?
    pub fn can_edit(&self, ticket: &Ticket) -> bool {
        self.profile.is_privileged() || ticket.requester_id == self.id
    }

    /// May this user assign a responsible to tickets?
    pub fn can_assume(&self) -> bool {
        self.profile.is_privileged()
    }

    /// Would this ticket appear in the user's listings?
    pub fn can_see(&self, ticket: &Ticket) -> bool {
        self.scope().admits(ticket)
    }

    pub fn scope(&self) -> Scope {
        Scope::for_user(self)
    }
}

/// Visibility restriction applied to every ticket listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every ticket
    All,
    /// Only tickets whose requester is this user id
    RequesterOnly(i64),
}

impl Scope {
    pub fn for_user(user: &User) -> Self {
        if user.profile.is_privileged() {
            Scope::All
        } else {
            Scope::RequesterOnly(user.id)
        }
    }

    pub fn admits(&self, ticket: &Ticket) -> bool {
        match self {
            Scope::All => true,
            Scope::RequesterOnly(id) => ticket.requester_id == *id,
        }
    }
}
