//! Pure input checks. Each returns the first failing rule only.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::error::ValidationError;
use crate::contract::model::EventRequest;
use crate::domain::datetime;

pub const MAX_EVENT_NAME_LENGTH: usize = 100;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern compiles"));

type Validation = Result<(), ValidationError>;

pub fn validate_event_name(name: &str, max_len: usize) -> Validation {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name", "Event name is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            "name",
            format!("Event name must be at most {max_len} characters"),
        ));
    }
    Ok(())
}

pub fn validate_date(date: &str) -> Validation {
    if date.trim().is_empty() {
        return Err(ValidationError::new("date", "Date is required"));
    }
    if datetime::parse_date(date).is_none() {
        return Err(ValidationError::new("date", "Invalid date format (use M/d/yyyy)"));
    }
    Ok(())
}

/// Absent or blank is valid; otherwise a 12-hour time with AM/PM.
pub fn validate_time(time: Option<&str>) -> Validation {
    match time.map(str::trim) {
        None | Some("") => Ok(()),
        Some(t) if datetime::is_12h_time(t) => Ok(()),
        Some(_) => Err(ValidationError::new("time", "Invalid time format (use h:mm AM/PM)")),
    }
}

/// Counts digits only, so `(555) 123-4567` passes.
pub fn validate_phone(phone: &str) -> Validation {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(ValidationError::new(
            "phone",
            format!("Phone number must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits"),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Validation {
    let len = username.trim().chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(ValidationError::new(
            "username",
            format!(
                "Username must be {MIN_USERNAME_LENGTH}-{MAX_USERNAME_LENGTH} characters"
            ),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Validation {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> Validation {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new("category", "Category name is required"));
    }
    if len > MAX_CATEGORY_NAME_LENGTH {
        return Err(ValidationError::new(
            "category",
            format!("Category name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_color(color: &str) -> Validation {
    if !COLOR_RE.is_match(color.trim()) {
        return Err(ValidationError::new("color", "Color must look like #RRGGBB"));
    }
    Ok(())
}

/// Name, then date, then time.
pub fn validate_event_request(req: &EventRequest, max_name_len: usize) -> Validation {
    validate_event_name(req.name(), max_name_len)?;
    validate_date(req.date())?;
    validate_time(req.time())
}
