//! Results of mutating help desk operations.
//!
//! Every write returns an [`Outcome`] instead of failing across the API
//! boundary. Its `Display` is the single-line Portuguese message existing
//! front ends show verbatim: failures always start with `Erro`, anything else
//! is a success.

use serde::Serialize;
use std::fmt;

/// The mutation an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateTicket,
    UpdateStatus,
    AssignResponsible,
    AddComment,
    AddTag,
    AddAttachment,
}

impl Action {
    fn success_message(&self) -> &'static str {
        match self {
            Action::CreateTicket => "Ticket criado com sucesso!",
            Action::UpdateStatus => "Status atualizado com sucesso",
            Action::AssignResponsible => "Responsável atribuído com sucesso",
            Action::AddComment => "Comentário adicionado com sucesso",
            Action::AddTag => "Tag adicionada com sucesso",
            Action::AddAttachment => "Anexo adicionado com sucesso",
        }
    }

    fn store_error_prefix(&self) -> &'static str {
        match self {
            Action::CreateTicket => "Erro ao criar ticket",
            Action::UpdateStatus => "Erro ao atualizar status",
            Action::AssignResponsible => "Erro ao atribuir responsável",
            Action::AddComment => "Erro ao adicionar comentário",
            Action::AddTag => "Erro ao adicionar tag",
            Action::AddAttachment => "Erro ao adicionar anexo",
        }
    }

    fn forbidden_message(&self) -> &'static str {
        match self {
            Action::AssignResponsible => "Erro: Sem permissão para atribuir responsável",
            _ => "Erro: Sem permissão para editar este ticket",
        }
    }
}

/// Entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Ticket,
    User,
    Category,
}

/// Tagged result of a write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A ticket was inserted with this id
    Created { id: i64 },
    Done { action: Action },
    /// No acting principal
    Unauthenticated,
    /// Input rejected before reaching the store
    Invalid { reason: String },
    Forbidden { action: Action },
    NotFound { target: Target },
    /// The store refused the statement
    StoreError { action: Action, message: String },
}

impl Outcome {
    pub fn done(action: Action) -> Self {
        Outcome::Done { action }
    }

    /// Reject input. The reason is flattened to one line, since it may echo
    /// what the caller sent.
    pub fn invalid(reason: impl AsRef<str>) -> Self {
        Outcome::Invalid {
            reason: single_line(reason.as_ref()),
        }
    }

    pub fn forbidden(action: Action) -> Self {
        Outcome::Forbidden { action }
    }

    pub fn not_found(target: Target) -> Self {
        Outcome::NotFound { target }
    }

    /// Wrap a store failure, flattened to one line.
    pub fn store_error(action: Action, err: &crate::Error) -> Self {
        Outcome::StoreError {
            action,
            message: single_line(&err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Created { .. } | Outcome::Done { .. })
    }

    /// Id of the ticket a successful create produced.
    pub fn created_id(&self) -> Option<i64> {
        match self {
            Outcome::Created { id } => Some(*id),
            _ => None,
        }
    }
}

fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { id } => {
                write!(f, "{} ID: {}", Action::CreateTicket.success_message(), id)
            }
            Outcome::Done { action } => f.write_str(action.success_message()),
            Outcome::Unauthenticated => f.write_str("Erro: Usuário não autenticado"),
            Outcome::Invalid { reason } => write!(f, "Erro: {}", reason),
            Outcome::Forbidden { action } => f.write_str(action.forbidden_message()),
            Outcome::NotFound { target } => f.write_str(match target {
                Target::Ticket => "Erro: Ticket não encontrado",
                Target::User => "Erro: Usuário não encontrado",
                Target::Category => "Erro: Categoria não encontrada",
            }),
            Outcome::StoreError { action, message } => {
                write!(f, "{}: {}", action.store_error_prefix(), message)
            }
        }
    }
}
