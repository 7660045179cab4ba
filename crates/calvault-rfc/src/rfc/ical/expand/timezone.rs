//! Timezone resolution and wall-clock/UTC conversion.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone canonicalization.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

use crate::rfc::ical::core::{DateTime as ICalDateTime, DateTimeForm};

/// Error during timezone conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Wall-clock time skipped by a DST transition, even after shifting.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),

    /// Date-time fields do not form a real calendar value.
    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

/// Resolves TZIDs to `chrono_tz` zones, caching each lookup.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    /// Creates a new timezone resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// Windows names and vendor-prefixed TZIDs are normalized first.
    ///
    /// ## Errors
    ///
    /// Returns `ConversionError::UnknownTimezone` if the TZID cannot be resolved.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ConversionError> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);
        let tz = Tz::from_str(&normalized)
            .ok()
            .ok_or_else(|| ConversionError::UnknownTimezone(tzid.to_string()))?;

        tracing::trace!(tzid, resolved = %tz, "Resolved timezone");
        self.cache.insert(tzid.to_string(), tz);

        Ok(tz)
    }
}

/// Normalizes CalDAV/iCalendar timezone identifiers to IANA names.
///
/// Strips vendor prefixes, maps Windows zone names, and canonicalizes
/// IANA aliases (`Europe/Kiev` becomes `Europe/Kyiv`).
#[must_use]
pub fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid);

    let iana_parser = IanaParserExtended::new();

    if let Some(tz) = WindowsParser::new().parse(stripped, None)
        && let Some(entry) = iana_parser.iter().find(|entry| entry.time_zone == tz)
    {
        return entry.canonical.to_string();
    }

    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// ## Summary
/// Converts a wall-clock time in `tzid` to a UTC instant.
///
/// Ambiguous times (DST fold) take the earlier instant. Times inside a DST
/// gap are shifted forward by one hour.
///
/// ## Errors
///
/// Returns an error if the timezone cannot be resolved or the shifted time
/// still does not exist.
pub fn convert_to_utc(
    local_time: NaiveDateTime,
    tzid: &str,
    resolver: &mut TimeZoneResolver,
) -> Result<DateTime<Utc>, ConversionError> {
    let tz = resolver.resolve(tzid)?;

    let resolved = match tz.from_local_datetime(&local_time) {
        LocalResult::None => tz.from_local_datetime(&(local_time + TimeDelta::hours(1))),
        other => other,
    };

    match resolved {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{local_time} in timezone {tzid}"
        ))),
    }
}

/// ## Summary
/// Converts a UTC instant to the wall-clock time it shows in `tzid`.
///
/// ## Errors
///
/// Returns an error if the timezone cannot be resolved.
pub fn convert_from_utc(
    instant: DateTime<Utc>,
    tzid: &str,
    resolver: &mut TimeZoneResolver,
) -> Result<NaiveDateTime, ConversionError> {
    let tz = resolver.resolve(tzid)?;
    Ok(instant.with_timezone(&tz).naive_local())
}

/// ## Summary
/// Resolves an iCalendar DATE-TIME to a UTC instant.
///
/// Floating values are read as UTC.
///
/// ## Errors
///
/// Returns an error if the fields are not a real date-time or the TZID is
/// unknown.
pub fn datetime_to_utc(
    value: &ICalDateTime,
    resolver: &mut TimeZoneResolver,
) -> Result<DateTime<Utc>, ConversionError> {
    let naive = value
        .to_naive()
        .ok_or_else(|| ConversionError::InvalidDateTime(value.to_string()))?;

    match &value.form {
        DateTimeForm::Utc | DateTimeForm::Floating => Ok(naive.and_utc()),
        DateTimeForm::Zoned { tzid } => convert_to_utc(naive, tzid, resolver),
    }
}
