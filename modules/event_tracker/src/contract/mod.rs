pub mod client;
pub mod error;
pub mod model;

pub use client::EventTrackerApi;
pub use error::{EventTrackerError, ValidationError};
pub use model::{
    Category, CategoryCount, CategoryId, ConflictPolicy, Event, EventId, EventRequest,
    NewCategory, SortOrder, TimeContext, User, UserId,
};
