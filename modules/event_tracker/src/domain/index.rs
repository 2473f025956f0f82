//! Derived per-user lookup structures, rebuilt from the store on every load.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use chrono::{Days, NaiveDate};

use crate::contract::model::{composite_key, CategoryId, Event, SortDate, SortOrder, UserId};

/// Autocomplete needs at least this many characters.
pub const MIN_COMPLETION_PREFIX: usize = 2;

/// Immutable snapshot of one user's events with date-priority, name, date
/// and name+date lookups. Positions refer to `events`, which keeps store order.
#[derive(Debug, Clone)]
pub struct EventIndex {
    user_id: UserId,
    events: Vec<Event>,
    queue: BinaryHeap<Reverse<(SortDate, usize)>>,
    by_name: HashMap<String, usize>,
    by_date: HashMap<String, Vec<usize>>,
    by_composite: HashMap<String, usize>,
}

impl EventIndex {
    pub fn build(user_id: UserId, events: Vec<Event>) -> Self {
        let mut queue = BinaryHeap::with_capacity(events.len());
        let mut by_name = HashMap::with_capacity(events.len());
        let mut by_date: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_composite = HashMap::with_capacity(events.len());

        for (pos, event) in events.iter().enumerate() {
            queue.push(Reverse((event.sort_date(), pos)));
            // Later events win on name collisions.
            by_name.insert(event.name.clone(), pos);
            by_date.entry(event.date.clone()).or_default().push(pos);
            by_composite.insert(composite_key(&event.date, &event.name), pos);
        }

        Self {
            user_id,
            events,
            queue,
            by_name,
            by_date,
            by_composite,
        }
    }

    pub fn empty(user_id: UserId) -> Self {
        Self::build(user_id, Vec::new())
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in store order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: crate::contract::model::EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Earliest event by date; ties go to the earlier stored event.
    pub fn peek_next(&self) -> Option<&Event> {
        self.queue.peek().map(|Reverse((_, pos))| &self.events[*pos])
    }

    /// Events dated within `[today, today + horizon_days]`, earliest first.
    pub fn upcoming(&self, today: NaiveDate, horizon_days: u32) -> Vec<Event> {
        let end = today
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .unwrap_or(NaiveDate::MAX);
        let mut found: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.parsed_date().is_some_and(|d| d >= today && d <= end))
            .cloned()
            .collect();
        found.sort_by(Event::cmp_by_date);
        found
    }

    /// Events in the category (any when `None`) dated within the inclusive
    /// bounds, earliest first. Once a bound is set, unparsable dates are left out.
    pub fn filtered(
        &self,
        category: Option<CategoryId>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<Event> {
        let mut found: Vec<Event> = self
            .events
            .iter()
            .filter(|e| {
                category.map_or(true, |id| e.category.as_ref().is_some_and(|c| c.id == id))
            })
            .filter(|e| {
                if from.is_none() && to.is_none() {
                    return true;
                }
                e.parsed_date().is_some_and(|d| {
                    !matches!(from, Some(lo) if d < lo) && !matches!(to, Some(hi) if d > hi)
                })
            })
            .cloned()
            .collect();
        found.sort_by(Event::cmp_by_date);
        found
    }

    /// Exact, case-sensitive name match.
    pub fn by_name(&self, name: &str) -> Option<&Event> {
        self.by_name.get(name).map(|pos| &self.events[*pos])
    }

    /// Events on the literal date string, in store order.
    pub fn by_date(&self, date: &str) -> Vec<Event> {
        self.by_date
            .get(date)
            .map(|positions| positions.iter().map(|p| self.events[*p].clone()).collect())
            .unwrap_or_default()
    }

    pub fn by_name_and_date(&self, name: &str, date: &str) -> Option<&Event> {
        self.by_composite
            .get(&composite_key(date, name))
            .map(|pos| &self.events[*pos])
    }

    pub fn contains_name_and_date(&self, name: &str, date: &str) -> bool {
        self.by_composite.contains_key(&composite_key(date, name))
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<Event> {
        let mut out = self.events.clone();
        match order {
            SortOrder::DateAsc => out.sort_by(Event::cmp_by_date),
            SortOrder::DateDesc => out.sort_by(date_desc),
            SortOrder::NameAsc => out.sort_by_cached_key(|e| e.name.to_lowercase()),
            SortOrder::NameDesc => {
                out.sort_by_cached_key(|e| Reverse(e.name.to_lowercase()))
            }
            // Untimed events come before timed ones.
            SortOrder::TimeAsc => out.sort_by_key(|e| e.parsed_time()),
            SortOrder::TimeDesc => out.sort_by_key(|e| Reverse(e.parsed_time())),
        }
        out
    }

    /// Distinct event names for autocomplete: prefix matches first, then
    /// substring matches, each group alphabetical. Case-insensitive.
    pub fn complete_name(&self, input: &str) -> Vec<String> {
        let needle = input.trim().to_lowercase();
        if needle.chars().count() < MIN_COMPLETION_PREFIX {
            return Vec::new();
        }

        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort_by_key(|n| n.to_lowercase());

        let (mut prefix, mut inner) = (Vec::new(), Vec::new());
        for name in names {
            let lower = name.to_lowercase();
            if lower.starts_with(&needle) {
                prefix.push(name.clone());
            } else if lower.contains(&needle) {
                inner.push(name.clone());
            }
        }
        prefix.extend(inner);
        prefix
    }
}

/// Latest parsed date first; unparsable dates stay at the end.
fn date_desc(a: &Event, b: &Event) -> Ordering {
    match (a.sort_date(), b.sort_date()) {
        (SortDate::Parsed(x), SortDate::Parsed(y)) => y.cmp(&x),
        (x, y) => x.cmp(&y),
    }
}
