//! Read-only mapping of `event_summary_view` (events joined to their category).

use sea_orm::entity::prelude::*;

use crate::contract::model::{Category, Event};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_summary_view")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub date: String,
    pub time: Option<String>,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(m: Model) -> Self {
        let category = match (m.category_id, m.category_name, m.category_color) {
            (Some(id), Some(name), Some(color)) => Some(Category {
                id,
                name,
                color,
                user_id: m.user_id,
            }),
            _ => None,
        };
        Self {
            id: m.id,
            name: m.name,
            date: m.date,
            time: m.time,
            user_id: m.user_id,
            category,
        }
    }
}
