//! Conversion between spreadsheet-local timestamps (`M/D/YYYY H:M[:S]`)
//! and the UTC ISO-8601 form Canvas uses (`YYYY-MM-DDTHH:MM:SSZ`).

use std::fmt::Display;
use std::sync::LazyLock;

use chrono::{Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use regex::Regex;

use crate::error::AppError;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const LOCAL_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

static ISO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z").expect("valid regex"));

static LOCAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,} \d{1,2}:\d{2}").expect("valid regex"));

// M/D/YYYY H:M:S, M/D/YYYY H:M, M/D/YY H:M:S, M/D/YY H:M
static LOCAL_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2}) (\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$")
        .expect("valid regex")
});

pub fn is_iso(value: &str) -> bool {
    ISO_PATTERN.is_match(value)
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "None"
}

/// Converts a spreadsheet date in the system timezone to UTC ISO-8601.
pub fn local_to_iso(value: &str) -> Result<String, AppError> {
    local_to_iso_in(value, &Local)
}

/// Converts a UTC ISO-8601 date to a spreadsheet date in the system timezone.
pub fn iso_to_local(value: &str) -> Result<String, AppError> {
    iso_to_local_in(value, &Local)
}

/// Converts a local date in `tz` to UTC ISO-8601. Values already in ISO
/// form pass through. A result landing on minute 59 gets second 59.
pub fn local_to_iso_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Result<String, AppError> {
    let value = value.trim();
    if is_blank(value) {
        return Ok(String::new());
    }
    if is_iso(value) {
        return Ok(value.to_string());
    }

    let naive = parse_local(value)?;
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return Err(AppError::DateParse(value.to_string())),
    };

    let mut utc = local.with_timezone(&Utc);
    if utc.minute() == 59 {
        utc = utc.with_second(59).unwrap_or(utc);
    }
    Ok(utc.format(ISO_FORMAT).to_string())
}

/// Converts a UTC ISO-8601 date to `M/D/YYYY H:M:S` in `tz`. Values
/// already in local form pass through.
pub fn iso_to_local_in<Tz>(value: &str, tz: &Tz) -> Result<String, AppError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let value = value.trim();
    if is_blank(value) {
        return Ok(String::new());
    }
    if LOCAL_PATTERN.is_match(value) {
        return Ok(value.to_string());
    }

    let naive = NaiveDateTime::parse_from_str(value, ISO_FORMAT)
        .map_err(|_| AppError::DateParse(value.to_string()))?;
    let local = Utc.from_utc_datetime(&naive).with_timezone(tz);
    Ok(local.format(LOCAL_FORMAT).to_string())
}

fn parse_local(value: &str) -> Result<NaiveDateTime, AppError> {
    let invalid = || AppError::DateParse(value.to_string());
    let caps = LOCAL_PARTS.captures(value).ok_or_else(invalid)?;

    let number = |i: usize| -> Result<u32, AppError> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<u32>())
            .map_err(|_| invalid())
    };

    let year_text = &caps[3];
    let year = year_text.parse::<i32>().map_err(|_| invalid())?;
    let year = match year_text.len() {
        2 if year < 69 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    };

    let (month, day) = (number(1)?, number(2)?);
    let (hour, minute, second) = (number(4)?, number(5)?, number(6)?);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)
}
