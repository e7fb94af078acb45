//! Coarse, human-friendly rendering of time spans ("17 hours", "a day", "3 months ago").
//!
//! Each unit is the whole span expressed in that unit and rounded to the nearest
//! integer, so 36 hours reads as "2 days" rather than "a day and 12 hours".

use chrono::{DateTime, Duration, Utc};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// Months per day averaged over the 400-year Gregorian cycle.
const MONTHS_PER_DAY: f64 = 4_800.0 / 146_097.0;

const SECONDS_THRESHOLD: f64 = 45.0;
const MINUTES_THRESHOLD: f64 = 45.0;
const HOURS_THRESHOLD: f64 = 22.0;
const DAYS_THRESHOLD: f64 = 26.0;
const MONTHS_THRESHOLD: f64 = 11.0;

/// Renders the magnitude of `span`; the sign is ignored.
pub fn duration(span: Duration) -> String {
    let ms = span.num_milliseconds().unsigned_abs() as f64;

    let seconds = (ms / MS_PER_SECOND).round();
    let minutes = (ms / MS_PER_MINUTE).round();
    let hours = (ms / MS_PER_HOUR).round();
    let days = (ms / MS_PER_DAY).round();
    let months = (ms / MS_PER_DAY * MONTHS_PER_DAY).round();
    let years = (ms / MS_PER_DAY * MONTHS_PER_DAY / 12.0).round();

    if seconds < SECONDS_THRESHOLD {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < MINUTES_THRESHOLD {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < HOURS_THRESHOLD {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < DAYS_THRESHOLD {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < MONTHS_THRESHOLD {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}

/// Renders `instant` relative to `now`: "5 hours ago" for the past, "in 5 hours" for the future.
pub fn relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let span = now - instant;
    let phrase = duration(span);
    if span < Duration::zero() {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}
