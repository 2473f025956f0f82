//! Text renderings of a user's events for file export.

use std::fmt::Write as _;

use crate::contract::model::{CategoryCount, Event, UserId};

pub const CSV_HEADER: &str = "Event ID,Event Name,Date,Time,Category";
const UNCATEGORIZED: &str = "Uncategorized";

/// Name is always quoted with inner quotes doubled; other fields are raw.
pub fn csv_row(event: &Event) -> String {
    format!(
        "{},\"{}\",{},{},{}",
        event.id,
        event.name.replace('"', "\"\""),
        event.date,
        event.time.as_deref().unwrap_or(""),
        event.category_name().unwrap_or(""),
    )
}

/// Header plus one row per event, newline-terminated.
pub fn render_csv(events: &[Event]) -> String {
    let mut out = String::with_capacity(64 * (events.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for event in events {
        out.push_str(&csv_row(event));
        out.push('\n');
    }
    out
}

/// Event table followed by a per-category rollup sorted by category name.
/// Events without a category are counted under "Uncategorized" when present.
pub fn render_summary(user_id: UserId, events: &[Event], counts: &[CategoryCount]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Event Summary for User ID: {user_id}");
    out.push('\n');
    out.push_str("Event Details:\n");
    out.push_str(&render_csv(events));

    out.push_str("\nCategory Summary:\n");
    out.push_str("Category,Event Count\n");
    let mut rows: Vec<(&str, u64)> = counts
        .iter()
        .map(|c| (c.category.name.as_str(), c.count))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (name, count) in rows {
        let _ = writeln!(out, "{name},{count}");
    }
    let uncategorized = events.iter().filter(|e| e.category.is_none()).count();
    if uncategorized > 0 {
        let _ = writeln!(out, "{UNCATEGORIZED},{uncategorized}");
    }
    out
}
