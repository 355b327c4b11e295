//! Resolves a canonical timezone name to the current UTC offset.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current UTC offset of `canonical_timezone`, e.g. "Asia/Seoul", or
/// `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone name is unknown.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    local_now(canonical_timezone).map(|now| now.date())
}

/// The current date-time in `canonical_timezone`.
pub fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    let offset = get_local_offset(canonical_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {canonical_timezone}");
        Error::InvalidTimezoneError(canonical_timezone.to_owned())
    })?;

    Ok(OffsetDateTime::now_utc().to_offset(offset))
}
