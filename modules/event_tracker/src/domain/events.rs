use chrono::{DateTime, Utc};

use crate::contract::model::{EventId, UserId};

/// Transport-agnostic domain event, published after each successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDomainEvent {
    Created {
        id: EventId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
    Updated {
        id: EventId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
    Deleted {
        id: EventId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
}

impl EventDomainEvent {
    pub fn event_id(&self) -> EventId {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } | Self::Deleted { id, .. } => *id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Created { user_id, .. }
            | Self::Updated { user_id, .. }
            | Self::Deleted { user_id, .. } => *user_id,
        }
    }
}
