pub mod categories;
pub mod event_summary;
pub mod events;
pub mod users;
