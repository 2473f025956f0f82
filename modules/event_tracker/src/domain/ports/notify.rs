use async_trait::async_trait;

use crate::domain::error::DomainError;

/// Outbound text message delivery. Callers treat failures as log-only.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DomainError>;
}
