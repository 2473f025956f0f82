use thiserror::Error;

use crate::contract::error::ValidationError;
use crate::contract::model::{CategoryId, Event, EventId};

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Event not found: {id}")]
    EventNotFound { id: EventId },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: CategoryId },

    #[error("User not found: {user}")]
    UserNotFound { user: String },

    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Time conflict with {} event(s)", conflicts.len())]
    TimeConflict { conflicts: Vec<Event> },

    #[error("Event '{name}' already exists on {date}")]
    DuplicateEvent { name: String, date: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("{service} call failed: {message}")]
    ExternalService { service: String, message: String },
}

impl DomainError {
    pub fn event_not_found(id: EventId) -> Self {
        Self::EventNotFound { id }
    }

    pub fn category_not_found(id: CategoryId) -> Self {
        Self::CategoryNotFound { id }
    }

    pub fn user_not_found(user: impl ToString) -> Self {
        Self::UserNotFound {
            user: user.to_string(),
        }
    }

    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_event(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self::DuplicateEvent {
            name: name.into(),
            date: date.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for DomainError {
    fn from(e: ValidationError) -> Self {
        Self::Validation {
            field: e.field,
            message: e.message,
        }
    }
}
