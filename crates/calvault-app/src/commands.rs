//! Offline operations on a single VEVENT, backing the command line.

use std::path::Path;

use calvault_core::config::RecurrenceConfig;
use calvault_rfc::error::RfcError;
use calvault_rfc::rfc::ical::core::Component;
use calvault_rfc::rfc::ical::parse::parse_event;
use calvault_service::calendar::attendees::{from_internal_attendee, generate_attendee_token};
use calvault_service::calendar::{AttendeeClear, Occurrence, OccurrenceCache, RecurrenceExpander};
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// ## Summary
/// Parses a `YYYY-MM-DD` day into the UTC instant at its start.
///
/// ## Errors
/// Returns `InvalidArgument` if `day` is not a calendar date.
pub fn parse_day(day: &str) -> AppResult<DateTime<Utc>> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::InvalidArgument(format!("expected YYYY-MM-DD, got {day:?}")))
}

/// ## Summary
/// Reads an iCalendar file.
///
/// ## Errors
/// Returns `IoError` if the file cannot be read as UTF-8 text.
pub async fn read_ics(path: &Path) -> AppResult<String> {
    let ics = tokio::fs::read_to_string(path).await?;
    tracing::debug!(path = %path.display(), bytes = ics.len(), "Read iCalendar file");
    Ok(ics)
}

fn read_event(ics: &str) -> AppResult<Component> {
    Ok(parse_event(ics).map_err(RfcError::from)?)
}

/// ## Summary
/// Expands the event in `ics` over `[from, to]`.
///
/// ## Errors
/// Returns an error if the input is not a VEVENT or the interval is reversed.
/// Expansion failures are not errors: they are logged and yield no
/// occurrences.
pub fn expand(
    ics: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    config: &RecurrenceConfig,
) -> AppResult<Vec<Occurrence>> {
    if to < from {
        return Err(AppError::InvalidArgument(format!(
            "interval ends ({to}) before it starts ({from})"
        )));
    }

    let event = read_event(ics)?;
    let expander = RecurrenceExpander::from_config(config);
    Ok(expander.get_occurrences_between(&event, from, to, &mut OccurrenceCache::new()))
}

/// ## Summary
/// Returns the server-side record of every attendee of the event in `ics`.
///
/// ## Errors
/// Returns an error if the input is not a VEVENT, has no UID, or an attendee
/// has neither a token nor an address.
pub fn attendee_records(ics: &str) -> AppResult<Vec<AttendeeClear>> {
    let event = read_event(ics)?;
    let uid = event
        .uid()
        .ok_or_else(|| AppError::InvalidArgument("event has no UID".into()))?;

    event
        .attendees()
        .into_iter()
        .map(|attendee| {
            from_internal_attendee(attendee, uid)
                .map(|(_, record)| record)
                .map_err(AppError::from)
        })
        .collect()
}

/// Derives the correlation token for `email` in the event `uid`.
#[must_use]
pub fn token(uid: &str, email: &str) -> String {
    generate_attendee_token(email, uid)
}

#[cfg(test)]
mod tests {
    use calvault_service::calendar::AttendeeStatus;

    use super::*;

    const DAILY: &str = "BEGIN:VEVENT\r\n\
UID:daily@example.com\r\n\
DTSTART:20240301T080000Z\r\n\
DTEND:20240301T083000Z\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
ATTENDEE;PARTSTAT=DECLINED;X-PM-PERMISSIONS=3:mailto:a@example.com\r\n\
ATTENDEE;X-PM-TOKEN=kept:mailto:b@example.com\r\n\
END:VEVENT\r\n";

    #[test]
    fn parse_day_accepts_iso_dates_only() {
        assert_eq!(
            parse_day("2024-03-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap()
                .and_utc()
        );
        assert!(matches!(parse_day("02.03.2024"), Err(AppError::InvalidArgument(_))));
    }

    #[test_log::test]
    fn expand_uses_configured_expander() {
        let occurrences = expand(
            DAILY,
            parse_day("2024-03-02").unwrap(),
            parse_day("2024-03-04").unwrap(),
            &RecurrenceConfig::default(),
        )
        .unwrap();

        let numbers: Vec<u32> = occurrences.iter().map(|o| o.occurrence_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test_log::test(tokio::test)]
    async fn read_ics_loads_file_and_reports_missing_one() {
        let path = std::env::temp_dir().join(format!("calvault-{}.ics", std::process::id()));
        tokio::fs::write(&path, DAILY).await.unwrap();

        let ics = read_ics(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(ics, DAILY);
        assert!(matches!(read_ics(&path).await, Err(AppError::IoError(_))));
    }

    #[test]
    fn expand_rejects_reversed_interval() {
        let result = expand(
            DAILY,
            parse_day("2024-03-04").unwrap(),
            parse_day("2024-03-02").unwrap(),
            &RecurrenceConfig::default(),
        );
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn attendee_records_follow_wire_rules() {
        let records = attendee_records(DAILY).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].token, token("daily@example.com", "a@example.com"));
        assert_eq!(records[0].permissions, 3);
        assert_eq!(records[0].status, Some(AttendeeStatus::Declined));
        assert_eq!(records[1].token, "kept");
        assert_eq!(records[1].status, Some(AttendeeStatus::NeedsAction));
    }
}
