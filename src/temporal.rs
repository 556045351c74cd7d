// Temporal Model - dates, day arithmetic and visa status derivation
//
// Dates arrive as ISO 8601 strings. A bare `YYYY-MM-DD` means midnight UTC.
// Day differences round up, so any fraction of a remaining day counts as a day.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

use crate::entities::VisaStatus;
use crate::error::{AppError, Result};

/// Visas with this many days left or fewer are "EXPIRING SOON"
pub const EXPIRING_SOON_DAYS: i64 = 90;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Parse a calendar date or an RFC 3339 instant
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::validation(format!("Invalid date: {value:?}")))
}

/// ceil((end - start) / 1 day), negative when `end` is before `start`
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    let days = millis / MILLIS_PER_DAY;

    // Integer division truncates toward zero, which is already ceil for negatives
    if millis % MILLIS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}

pub fn add_days(date: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    date + Duration::days(days)
}

/// `YYYY-MM-DD`
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// RFC 3339 with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn days_remaining(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    days_between(now, expiration)
}

pub fn status_for_days(days_remaining: i64) -> VisaStatus {
    if days_remaining < 0 {
        VisaStatus::Expired
    } else if days_remaining <= EXPIRING_SOON_DAYS {
        VisaStatus::ExpiringSoon
    } else {
        VisaStatus::Active
    }
}

/// Status of a visa expiring on `expiration_date`, as seen at `now`
pub fn derive_status(expiration_date: &str, now: DateTime<Utc>) -> Result<VisaStatus> {
    let expiration = parse_date(expiration_date)?;
    Ok(status_for_days(days_remaining(expiration, now)))
}
