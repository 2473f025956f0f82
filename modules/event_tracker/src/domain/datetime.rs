//! Text formats for event dates (`M/d/yyyy`) and times (`h:mm AM`).

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4,})$").expect("date pattern compiles")
});

/// 12-hour clock, optional space before the marker, marker case-insensitive.
static TIME_12H_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(1[0-2]|0?[1-9]):([0-5][0-9])\s?([AaPp][Mm])$").expect("time pattern compiles")
});

static TIME_24H_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("time pattern compiles")
});

/// Parse `M/d/yyyy`. Leading zeros are optional; impossible calendar
/// dates such as `2/30/2025` or `13/1/2025` are rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(s.trim())?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Canonical `M/d/yyyy` without zero padding.
pub fn format_date(d: NaiveDate) -> String {
    format!("{}/{}/{}", d.month(), d.day(), d.year())
}

/// True when `s` is a 12-hour time with an AM/PM marker.
pub fn is_12h_time(s: &str) -> bool {
    TIME_12H_RE.is_match(s.trim())
}

/// Parse a 12-hour time; 24-hour `HH:mm` is also accepted for stored data.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if let Some(caps) = TIME_12H_RE.captures(s) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let pm = caps[3].eq_ignore_ascii_case("pm");
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        return NaiveTime::from_hms_opt(hour24, minute, 0);
    }
    let caps = TIME_24H_RE.captures(s)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)
}

/// `h:mm AM` / `h:mm PM`.
pub fn format_time_12h(t: NaiveTime) -> String {
    let (pm, hour) = t.hour12();
    format!("{}:{:02} {}", hour, t.minute(), if pm { "PM" } else { "AM" })
}

/// Minutes between two clock times on the same day.
pub fn minutes_apart(a: NaiveTime, b: NaiveTime) -> i64 {
    (a - b).num_minutes().abs()
}
