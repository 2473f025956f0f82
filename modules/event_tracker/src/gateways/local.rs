use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::contract::{
    client::EventTrackerApi,
    error::EventTrackerError,
    model::{
        Category, CategoryCount, CategoryId, ConflictPolicy, Event, EventId, EventRequest,
        NewCategory, SortOrder, TimeContext, UserId,
    },
};
use crate::domain::accounts::Accounts;
use crate::domain::service::Service;
use crate::domain::suggestion::SuggestionService;

/// Local implementation of the EventTrackerApi trait that delegates to the domain services
pub struct EventTrackerLocalClient {
    service: Arc<Service>,
    accounts: Arc<Accounts>,
    suggestions: Arc<SuggestionService>,
}

impl EventTrackerLocalClient {
    pub fn new(
        service: Arc<Service>,
        accounts: Arc<Accounts>,
        suggestions: Arc<SuggestionService>,
    ) -> Self {
        Self {
            service,
            accounts,
            suggestions,
        }
    }
}

#[async_trait]
impl EventTrackerApi for EventTrackerLocalClient {
    async fn register(&self, username: &str, password: &str) -> Result<UserId, EventTrackerError> {
        self.accounts
            .register(username, password)
            .await
            .map_err(Into::into)
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserId, EventTrackerError> {
        let user_id = self.accounts.login(username, password).await?;
        self.service.load_events(user_id).await?;
        Ok(user_id)
    }

    async fn user_id(&self, username: &str) -> Result<UserId, EventTrackerError> {
        self.accounts.user_id(username).await.map_err(Into::into)
    }

    async fn phone_number(&self, user_id: UserId) -> Result<Option<String>, EventTrackerError> {
        self.accounts.phone_number(user_id).await.map_err(Into::into)
    }

    async fn set_phone_number(
        &self,
        user_id: UserId,
        phone: &str,
    ) -> Result<(), EventTrackerError> {
        self.accounts
            .set_phone_number(user_id, phone)
            .await
            .map_err(Into::into)
    }

    async fn add_event(
        &self,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, EventTrackerError> {
        self.service.add_event(req, policy).await.map_err(Into::into)
    }

    async fn update_event(
        &self,
        id: EventId,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, EventTrackerError> {
        self.service
            .update_event(id, req, policy)
            .await
            .map_err(Into::into)
    }

    async fn delete_event(&self, user_id: UserId, id: EventId) -> Result<(), EventTrackerError> {
        self.service.delete_event(user_id, id).await.map_err(Into::into)
    }

    async fn list_events(
        &self,
        user_id: UserId,
        order: SortOrder,
    ) -> Result<Vec<Event>, EventTrackerError> {
        self.service
            .list_events(user_id, order)
            .await
            .map_err(Into::into)
    }

    async fn filter_events(
        &self,
        user_id: UserId,
        category_id: Option<CategoryId>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Event>, EventTrackerError> {
        self.service
            .filter_events(user_id, category_id, from, to)
            .await
            .map_err(Into::into)
    }

    async fn next_event(&self, user_id: UserId) -> Result<Option<Event>, EventTrackerError> {
        self.service.next_event(user_id).await.map_err(Into::into)
    }

    async fn upcoming_events(&self, user_id: UserId) -> Result<Vec<Event>, EventTrackerError> {
        self.service.upcoming_events(user_id).await.map_err(Into::into)
    }

    async fn find_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<Event>, EventTrackerError> {
        self.service
            .find_by_name(user_id, name)
            .await
            .map_err(Into::into)
    }

    async fn events_on_date(
        &self,
        user_id: UserId,
        date: &str,
    ) -> Result<Vec<Event>, EventTrackerError> {
        self.service
            .events_on_date(user_id, date)
            .await
            .map_err(Into::into)
    }

    async fn find_by_name_and_date(
        &self,
        user_id: UserId,
        name: &str,
        date: &str,
    ) -> Result<Option<Event>, EventTrackerError> {
        self.service
            .find_by_name_and_date(user_id, name, date)
            .await
            .map_err(Into::into)
    }

    async fn check_conflicts(
        &self,
        req: &EventRequest,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, EventTrackerError> {
        self.service
            .check_conflicts(req, exclude)
            .await
            .map_err(Into::into)
    }

    async fn complete_name(
        &self,
        user_id: UserId,
        input: &str,
    ) -> Result<Vec<String>, EventTrackerError> {
        self.service
            .complete_name(user_id, input)
            .await
            .map_err(Into::into)
    }

    async fn categories(&self, user_id: UserId) -> Result<Vec<Category>, EventTrackerError> {
        self.service.categories(user_id).await.map_err(Into::into)
    }

    async fn add_category(&self, new: NewCategory) -> Result<Category, EventTrackerError> {
        self.service.add_category(new).await.map_err(Into::into)
    }

    async fn category_counts(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CategoryCount>, EventTrackerError> {
        self.service.category_counts(user_id).await.map_err(Into::into)
    }

    async fn export_csv(&self, user_id: UserId, path: &Path) -> Result<usize, EventTrackerError> {
        self.service
            .export_csv(user_id, path)
            .await
            .map_err(Into::into)
    }

    async fn events_summary(&self, user_id: UserId) -> Result<String, EventTrackerError> {
        self.service.events_summary(user_id).await.map_err(Into::into)
    }

    async fn export_summary(
        &self,
        user_id: UserId,
        path: &Path,
    ) -> Result<(), EventTrackerError> {
        self.service
            .export_summary(user_id, path)
            .await
            .map_err(Into::into)
    }

    async fn suggest_title(
        &self,
        user_id: UserId,
        time_context: TimeContext,
        location: Option<&str>,
    ) -> Result<String, EventTrackerError> {
        let recent = self
            .service
            .recent_events(user_id, self.suggestions.max_context_events())
            .await?;
        Ok(self
            .suggestions
            .suggest_title(&recent, time_context, location)
            .await)
    }
}
