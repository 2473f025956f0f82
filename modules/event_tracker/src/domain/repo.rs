use async_trait::async_trait;

use crate::contract::model::{
    Category, CategoryCount, CategoryId, Event, EventId, EventRequest, User, UserId,
};

/// Persistence operations on events. All writes are scoped to the owner.
#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Every event of the user, ordered by stored date then time text.
    async fn events_for_user(&self, user_id: UserId) -> anyhow::Result<Vec<Event>>;
    /// Insert and return the store-assigned id.
    async fn insert_event(&self, req: &EventRequest) -> anyhow::Result<EventId>;
    /// Returns false when no row of this user has that id.
    async fn update_event(&self, id: EventId, req: &EventRequest) -> anyhow::Result<bool>;
    /// Returns false when no row of this user has that id.
    async fn delete_event(&self, user_id: UserId, id: EventId) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait CategoriesRepository: Send + Sync {
    /// Ordered by name.
    async fn categories_for_user(&self, user_id: UserId) -> anyhow::Result<Vec<Category>>;
    async fn find_category(
        &self,
        user_id: UserId,
        id: CategoryId,
    ) -> anyhow::Result<Option<Category>>;
    async fn insert_category(
        &self,
        user_id: UserId,
        name: &str,
        color: &str,
    ) -> anyhow::Result<Category>;
    /// Every category of the user with its event count, zero included.
    async fn category_counts(&self, user_id: UserId) -> anyhow::Result<Vec<CategoryCount>>;
}

/// The store already holds an account with this username.
#[derive(Debug, thiserror::Error)]
#[error("username already exists")]
pub struct UsernameExists;

/// Stored account row, including the password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_user_by_name(&self, username: &str) -> anyhow::Result<Option<StoredUser>>;
    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    /// Insert the account and its starting categories atomically. A taken
    /// username fails with [`UsernameExists`].
    async fn insert_user_with_categories(
        &self,
        username: &str,
        password_hash: &str,
        default_categories: &[(&str, &str)],
    ) -> anyhow::Result<UserId>;
    /// Returns false when the user does not exist.
    async fn update_phone(&self, id: UserId, phone: Option<&str>) -> anyhow::Result<bool>;
}
