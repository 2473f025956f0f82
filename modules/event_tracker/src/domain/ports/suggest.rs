use async_trait::async_trait;

use crate::contract::model::{Event, TimeContext};
use crate::domain::error::DomainError;

/// Remote title generator. It carries no deadline of its own; the caller
/// races it against a timeout and falls back locally.
#[async_trait]
pub trait TitleSuggester: Send + Sync {
    async fn suggest(
        &self,
        recent: &[Event],
        time_context: TimeContext,
        location: Option<&str>,
    ) -> Result<String, DomainError>;
}
