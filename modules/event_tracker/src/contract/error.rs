use serde::Serialize;
use thiserror::Error;

use crate::contract::model::Event;

/// First failing validation rule: the offending field and a user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that are safe to expose to callers of the event tracker.
#[derive(Error, Debug, Clone)]
pub enum EventTrackerError {
    #[error("{what} not found")]
    NotFound { what: String },

    /// Overlapping events; the caller may retry with `ConflictPolicy::Proceed`.
    #[error("Time conflict with {} existing event(s)", conflicts.len())]
    Conflict { conflicts: Vec<Event> },

    #[error("{message}")]
    Duplicate { message: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("Internal error")]
    Internal,
}

impl EventTrackerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for EventTrackerError {
    fn from(e: ValidationError) -> Self {
        Self::Validation {
            field: e.field,
            message: e.message,
        }
    }
}

impl From<crate::domain::error::DomainError> for EventTrackerError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            EventNotFound { id } => Self::not_found(format!("Event {id}")),
            CategoryNotFound { id } => Self::not_found(format!("Category {id}")),
            UserNotFound { user } => Self::not_found(format!("User {user}")),
            UsernameTaken { username } => Self::Duplicate {
                message: format!("Username '{username}' is already taken"),
            },
            InvalidCredentials => Self::Unauthorized,
            Validation { field, message } => Self::Validation { field, message },
            TimeConflict { conflicts } => Self::Conflict { conflicts },
            DuplicateEvent { name, date } => Self::Duplicate {
                message: format!("An event named '{name}' already exists on {date}"),
            },
            Export { message } => Self::validation("export", message),
            Database { .. } | ExternalService { .. } => Self::Internal,
        }
    }
}
