use chrono::NaiveTime;

use crate::contract::model::{Event, EventId};
use crate::domain::datetime::{minutes_apart, parse_time};

/// Pairwise overlap test for events that share a date.
#[derive(Debug, Clone, Copy)]
pub struct ConflictChecker {
    window_minutes: i64,
}

impl Default for ConflictChecker {
    fn default() -> Self {
        Self::new(120)
    }
}

impl ConflictChecker {
    pub fn new(window_minutes: u32) -> Self {
        Self {
            window_minutes: i64::from(window_minutes),
        }
    }

    /// Both times must parse and be strictly closer than the window.
    /// Anything that cannot be evaluated is not a conflict.
    pub fn times_overlap(&self, a: Option<&str>, b: Option<&str>) -> bool {
        match (a.and_then(parse_time), b.and_then(parse_time)) {
            (Some(a), Some(b)) => self.parsed_overlap(a, b),
            _ => false,
        }
    }

    fn parsed_overlap(&self, a: NaiveTime, b: NaiveTime) -> bool {
        minutes_apart(a, b) < self.window_minutes
    }

    pub fn conflicts(&self, a: &Event, b: &Event) -> bool {
        a.date == b.date && self.times_overlap(a.time.as_deref(), b.time.as_deref())
    }

    /// Events from `same_date` that overlap a candidate at `time`.
    /// `exclude` skips the event being edited.
    pub fn find_conflicts(
        &self,
        time: Option<&str>,
        same_date: &[Event],
        exclude: Option<EventId>,
    ) -> Vec<Event> {
        let Some(candidate) = time.and_then(parse_time) else {
            return Vec::new();
        };
        same_date
            .iter()
            .filter(|e| Some(e.id) != exclude)
            .filter(|e| {
                e.parsed_time()
                    .is_some_and(|t| self.parsed_overlap(candidate, t))
            })
            .cloned()
            .collect()
    }
}
