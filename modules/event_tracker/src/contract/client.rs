use std::path::Path;

use async_trait::async_trait;

use crate::contract::{
    error::EventTrackerError,
    model::{
        Category, CategoryCount, CategoryId, ConflictPolicy, Event, EventId, EventRequest,
        NewCategory, SortOrder, TimeContext, UserId,
    },
};

/// Public API of the event tracker for in-process consumers.
#[async_trait]
pub trait EventTrackerApi: Send + Sync {
    // --- accounts ---

    /// Create an account with the default categories; returns its id.
    async fn register(&self, username: &str, password: &str) -> Result<UserId, EventTrackerError>;

    /// Check credentials and warm the user's event index.
    async fn login(&self, username: &str, password: &str) -> Result<UserId, EventTrackerError>;

    async fn user_id(&self, username: &str) -> Result<UserId, EventTrackerError>;

    async fn phone_number(&self, user_id: UserId) -> Result<Option<String>, EventTrackerError>;

    async fn set_phone_number(&self, user_id: UserId, phone: &str)
        -> Result<(), EventTrackerError>;

    // --- events ---

    /// With [`ConflictPolicy::Warn`] an overlap fails with `Conflict`.
    async fn add_event(
        &self,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, EventTrackerError>;

    async fn update_event(
        &self,
        id: EventId,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, EventTrackerError>;

    async fn delete_event(&self, user_id: UserId, id: EventId) -> Result<(), EventTrackerError>;

    async fn list_events(
        &self,
        user_id: UserId,
        order: SortOrder,
    ) -> Result<Vec<Event>, EventTrackerError>;

    /// Optional category and inclusive date bounds; dates compare as dates.
    async fn filter_events(
        &self,
        user_id: UserId,
        category_id: Option<CategoryId>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Event>, EventTrackerError>;

    async fn next_event(&self, user_id: UserId) -> Result<Option<Event>, EventTrackerError>;

    async fn upcoming_events(&self, user_id: UserId) -> Result<Vec<Event>, EventTrackerError>;

    async fn find_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<Event>, EventTrackerError>;

    async fn events_on_date(
        &self,
        user_id: UserId,
        date: &str,
    ) -> Result<Vec<Event>, EventTrackerError>;

    async fn find_by_name_and_date(
        &self,
        user_id: UserId,
        name: &str,
        date: &str,
    ) -> Result<Option<Event>, EventTrackerError>;

    async fn check_conflicts(
        &self,
        req: &EventRequest,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, EventTrackerError>;

    async fn complete_name(
        &self,
        user_id: UserId,
        input: &str,
    ) -> Result<Vec<String>, EventTrackerError>;

    // --- categories ---

    async fn categories(&self, user_id: UserId) -> Result<Vec<Category>, EventTrackerError>;

    async fn add_category(&self, new: NewCategory) -> Result<Category, EventTrackerError>;

    async fn category_counts(&self, user_id: UserId)
        -> Result<Vec<CategoryCount>, EventTrackerError>;

    // --- export ---

    /// Returns the number of exported events.
    async fn export_csv(&self, user_id: UserId, path: &Path) -> Result<usize, EventTrackerError>;

    async fn events_summary(&self, user_id: UserId) -> Result<String, EventTrackerError>;

    async fn export_summary(&self, user_id: UserId, path: &Path)
        -> Result<(), EventTrackerError>;

    // --- suggestions ---

    /// Always yields a title; remote failures fall back locally.
    async fn suggest_title(
        &self,
        user_id: UserId,
        time_context: TimeContext,
        location: Option<&str>,
    ) -> Result<String, EventTrackerError>;
}
