use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::contract::error::ValidationError;
use crate::domain::datetime;

pub type UserId = i32;
pub type EventId = i32;
pub type CategoryId = i32;

/// A registered account. The password hash never leaves the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// `#RRGGBB`
    pub color: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: UserId,
    pub name: String,
    /// Falls back to the default color when absent.
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: u64,
}

/// A calendar entry owned by one user.
///
/// Identity is the store-assigned `id`: equality and hashing ignore every
/// other field, so an edited event still compares equal to its old self.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// `M/d/yyyy` as entered.
    pub date: String,
    /// `h:mm AM` as entered, if any.
    pub time: Option<String>,
    pub user_id: UserId,
    pub category: Option<Category>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Event {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        datetime::parse_date(&self.date)
    }

    pub fn parsed_time(&self) -> Option<NaiveTime> {
        self.time.as_deref().and_then(datetime::parse_time)
    }

    /// Sort key where unparsable dates are greater than every real date.
    pub fn sort_date(&self) -> SortDate {
        match self.parsed_date() {
            Some(d) => SortDate::Parsed(d),
            None => SortDate::Unparsable,
        }
    }

    /// Ascending by parsed date, unparsable dates last. Ties are equal.
    pub fn cmp_by_date(&self, other: &Self) -> Ordering {
        self.sort_date().cmp(&other.sort_date())
    }

    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.parsed_date().is_some_and(|d| d < today)
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.parsed_date() == Some(today)
    }

    /// Negative for past events; `None` when the date does not parse.
    pub fn days_until(&self, today: NaiveDate) -> Option<i64> {
        self.parsed_date().map(|d| (d - today).num_days())
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortDate {
    Parsed(NaiveDate),
    Unparsable,
}

/// Validated input for the add and update flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRequest {
    user_id: UserId,
    name: String,
    date: String,
    time: Option<String>,
    category_id: Option<CategoryId>,
}

impl EventRequest {
    pub fn builder(user_id: UserId) -> EventRequestBuilder {
        EventRequestBuilder {
            user_id,
            ..Default::default()
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// `date + "_" + name`, the duplicate-detection key.
    pub fn composite_key(&self) -> String {
        composite_key(&self.date, &self.name)
    }
}

pub fn composite_key(date: &str, name: &str) -> String {
    format!("{date}_{name}")
}

#[derive(Debug, Default, Clone)]
pub struct EventRequestBuilder {
    user_id: UserId,
    name: Option<String>,
    date: Option<String>,
    time: Option<String>,
    category_id: Option<CategoryId>,
}

impl EventRequestBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Blank times are treated as "no time".
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn time_opt(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }

    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Trims every field and checks that the required ones are present.
    /// Format checks happen in the validation layer.
    pub fn build(self) -> Result<EventRequest, ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::new("user_id", "a valid user is required"));
        }
        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Event name is required"));
        }
        let date = self.date.map(|d| d.trim().to_string()).unwrap_or_default();
        if date.is_empty() {
            return Err(ValidationError::new("date", "Date is required"));
        }
        let time = self
            .time
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(EventRequest {
            user_id: self.user_id,
            name,
            date,
            time,
            category_id: self.category_id,
        })
    }
}

/// What to do when a candidate event overlaps existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Refuse with the list of conflicts so the caller can ask the user.
    #[default]
    Warn,
    /// Save anyway.
    Proceed,
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DateAsc,
    DateDesc,
    NameAsc,
    NameDesc,
    TimeAsc,
    TimeDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::DateAsc,
        SortOrder::DateDesc,
        SortOrder::NameAsc,
        SortOrder::NameDesc,
        SortOrder::TimeAsc,
        SortOrder::TimeDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateAsc => "date-asc",
            SortOrder::DateDesc => "date-desc",
            SortOrder::NameAsc => "name-asc",
            SortOrder::NameDesc => "name-desc",
            SortOrder::TimeAsc => "time-asc",
            SortOrder::TimeDesc => "time-desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == wanted)
            .ok_or_else(|| {
                ValidationError::new("sort", format!("unknown sort order '{s}'"))
            })
    }
}

/// Coarse time of day used to flavour suggested titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeContext {
    Morning,
    Afternoon,
    Evening,
    Night,
    Anytime,
}

impl TimeContext {
    /// Morning 05-12, afternoon 12-17, evening 17-21, night otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeContext::Morning,
            12..=16 => TimeContext::Afternoon,
            17..=20 => TimeContext::Evening,
            _ => TimeContext::Night,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            TimeContext::Morning => Some("Morning"),
            TimeContext::Afternoon => Some("Afternoon"),
            TimeContext::Evening => Some("Evening"),
            TimeContext::Night => Some("Night"),
            TimeContext::Anytime => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: EventId, name: &str, date: &str) -> Event {
        Event {
            id,
            name: name.into(),
            date: date.into(),
            time: None,
            user_id: 1,
            category: None,
        }
    }

    #[test]
    fn equality_and_hash_use_id_only() {
        use std::collections::HashSet;

        let a = event(1, "Dentist", "3/10/2025");
        let b = event(1, "Renamed", "4/1/2026");
        let c = event(2, "Dentist", "3/10/2025");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Event> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn date_sort_puts_unparsable_last() {
        let mut events = vec![
            event(1, "broken", "soon"),
            event(2, "late", "12/31/2025"),
            event(3, "early", "1/2/2025"),
            event(4, "also broken", "2/30/2025"),
        ];
        events.sort_by(Event::cmp_by_date);
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(&names[..2], &["early", "late"]);
        assert!(events[2..].iter().all(|e| e.parsed_date().is_none()));
    }

    #[test]
    fn relative_day_helpers() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let past = event(1, "a", "3/9/2025");
        let now = event(2, "b", "3/10/2025");
        let soon = event(3, "c", "3/13/2025");
        let bad = event(4, "d", "someday");

        assert!(past.is_past(today));
        assert!(!now.is_past(today));
        assert!(now.is_today(today));
        assert_eq!(soon.days_until(today), Some(3));
        assert_eq!(past.days_until(today), Some(-1));
        assert_eq!(bad.days_until(today), None);
        assert!(!bad.is_past(today));
    }

    #[test]
    fn builder_trims_and_requires_fields() {
        let req = EventRequest::builder(1)
            .name("  Team Sync ")
            .date(" 3/10/2025")
            .time("  ")
            .build()
            .unwrap();
        assert_eq!(req.name(), "Team Sync");
        assert_eq!(req.date(), "3/10/2025");
        assert_eq!(req.time(), None);
        assert_eq!(req.composite_key(), "3/10/2025_Team Sync");

        let err = EventRequest::builder(1).date("3/10/2025").build().unwrap_err();
        assert_eq!(err.field, "name");
        let err = EventRequest::builder(1).name("x").build().unwrap_err();
        assert_eq!(err.field, "date");
        let err = EventRequest::builder(0).name("x").date("1/1/2025").build().unwrap_err();
        assert_eq!(err.field, "user_id");
    }

    #[test]
    fn sort_order_parses_its_own_names() {
        for order in SortOrder::ALL {
            assert_eq!(order.to_string().parse::<SortOrder>().unwrap(), order);
        }
        assert_eq!("NAME-DESC".parse::<SortOrder>().unwrap(), SortOrder::NameDesc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn time_context_boundaries() {
        assert_eq!(TimeContext::from_hour(4), TimeContext::Night);
        assert_eq!(TimeContext::from_hour(5), TimeContext::Morning);
        assert_eq!(TimeContext::from_hour(12), TimeContext::Afternoon);
        assert_eq!(TimeContext::from_hour(17), TimeContext::Evening);
        assert_eq!(TimeContext::from_hour(21), TimeContext::Night);
    }
}
