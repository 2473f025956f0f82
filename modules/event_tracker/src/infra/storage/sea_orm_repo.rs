//! SeaORM-backed repository implementing every persistence port.
//!
//! Generic over `C: ConnectionTrait`, so it works with a `DatabaseConnection`
//! or a transaction. Event reads go through `event_summary_view`.

use std::collections::HashMap;

use anyhow::Context;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::contract::model::{
    Category, CategoryCount, CategoryId, Event, EventId, EventRequest, User, UserId,
};
use crate::domain::repo::{
    CategoriesRepository, EventsRepository, StoredUser, UsernameExists, UsersRepository,
};
use crate::infra::storage::entity::{categories, event_summary, events, users};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> EventsRepository for SeaOrmRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn events_for_user(&self, user_id: UserId) -> anyhow::Result<Vec<Event>> {
        let rows = event_summary::Entity::find()
            .filter(event_summary::Column::UserId.eq(user_id))
            .order_by_asc(event_summary::Column::Date)
            .order_by_asc(event_summary::Column::Time)
            .all(&self.conn)
            .await
            .context("events_for_user failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_event(&self, req: &EventRequest) -> anyhow::Result<EventId> {
        let m = events::ActiveModel {
            id: NotSet,
            name: Set(req.name().to_string()),
            date: Set(req.date().to_string()),
            time: Set(req.time().map(str::to_string)),
            user_id: Set(req.user_id()),
            category_id: Set(req.category_id()),
        };
        let inserted = m.insert(&self.conn).await.context("insert_event failed")?;
        Ok(inserted.id)
    }

    async fn update_event(&self, id: EventId, req: &EventRequest) -> anyhow::Result<bool> {
        let res = events::Entity::update_many()
            .col_expr(events::Column::Name, Expr::value(req.name().to_string()))
            .col_expr(events::Column::Date, Expr::value(req.date().to_string()))
            .col_expr(events::Column::Time, Expr::value(req.time().map(str::to_string)))
            .col_expr(events::Column::CategoryId, Expr::value(req.category_id()))
            .filter(events::Column::Id.eq(id))
            .filter(events::Column::UserId.eq(req.user_id()))
            .exec(&self.conn)
            .await
            .context("update_event failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_event(&self, user_id: UserId, id: EventId) -> anyhow::Result<bool> {
        let res = events::Entity::delete_many()
            .filter(events::Column::Id.eq(id))
            .filter(events::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("delete_event failed")?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait::async_trait]
impl<C> CategoriesRepository for SeaOrmRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn categories_for_user(&self, user_id: UserId) -> anyhow::Result<Vec<Category>> {
        let rows = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("categories_for_user failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_category(
        &self,
        user_id: UserId,
        id: CategoryId,
    ) -> anyhow::Result<Option<Category>> {
        let found = categories::Entity::find_by_id(id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("find_category failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert_category(
        &self,
        user_id: UserId,
        name: &str,
        color: &str,
    ) -> anyhow::Result<Category> {
        let m = categories::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            user_id: Set(user_id),
        };
        let inserted = m.insert(&self.conn).await.context("insert_category failed")?;
        Ok(inserted.into())
    }

    async fn category_counts(&self, user_id: UserId) -> anyhow::Result<Vec<CategoryCount>> {
        let per_category: HashMap<i32, i64> = events::Entity::find()
            .select_only()
            .column(events::Column::CategoryId)
            .column_as(Expr::col(events::Column::Id).count(), "event_count")
            .filter(events::Column::UserId.eq(user_id))
            .filter(events::Column::CategoryId.is_not_null())
            .group_by(events::Column::CategoryId)
            .into_tuple::<(Option<i32>, i64)>()
            .all(&self.conn)
            .await
            .context("category_counts failed")?
            .into_iter()
            .filter_map(|(id, n)| id.map(|id| (id, n)))
            .collect();

        let categories = self.categories_for_user(user_id).await?;
        Ok(categories
            .into_iter()
            .map(|category| {
                let count = per_category.get(&category.id).copied().unwrap_or(0);
                CategoryCount {
                    category,
                    count: u64::try_from(count).unwrap_or(0),
                }
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_user_by_name(&self, username: &str) -> anyhow::Result<Option<StoredUser>> {
        let found = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("find_user_by_name failed")?;
        Ok(found.map(|m| StoredUser {
            password_hash: m.password_hash.clone(),
            user: m.into(),
        }))
    }

    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let found = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_user failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert_user_with_categories(
        &self,
        username: &str,
        password_hash: &str,
        default_categories: &[(&str, &str)],
    ) -> anyhow::Result<UserId> {
        let txn = self.conn.begin().await.context("begin registration failed")?;

        let user = users::ActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            phone: Set(None),
        };
        let user_id = match user.insert(&txn).await {
            Ok(inserted) => inserted.id,
            Err(e) if is_unique_violation(&e) => return Err(UsernameExists.into()),
            Err(e) => return Err(anyhow::Error::new(e).context("insert_user failed")),
        };

        for (name, color) in default_categories {
            categories::ActiveModel {
                id: NotSet,
                name: Set((*name).to_string()),
                color: Set((*color).to_string()),
                user_id: Set(user_id),
            }
            .insert(&txn)
            .await
            .with_context(|| format!("seeding category '{name}' failed"))?;
        }

        // Dropping the transaction on an early return rolls it back.
        txn.commit().await.context("commit registration failed")?;
        Ok(user_id)
    }

    async fn update_phone(&self, id: UserId, phone: Option<&str>) -> anyhow::Result<bool> {
        let res = users::Entity::update_many()
            .col_expr(users::Column::Phone, Expr::value(phone.map(str::to_string)))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("update_phone failed")?;
        Ok(res.rows_affected > 0)
    }
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
