//! Value type parsers for iCalendar (RFC 5545 §3.3).

use std::str::FromStr;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    Date, DateTime, DateTimeForm, Frequency, RRule, RRuleUntil, Weekday, WeekdayNum,
};

/// Parses `s` as a number, reporting `kind` on failure.
fn number<T: FromStr>(s: &str, kind: ParseErrorKind, line: usize, col: usize) -> ParseResult<T> {
    s.parse()
        .ok()
        .ok_or_else(|| ParseError::new(kind, line, col).with_context(s.to_string()))
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<Date> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let kind = ParseErrorKind::InvalidDate;
    let date = Date::new(
        number(&s[0..4], kind, line, col)?,
        number(&s[4..6], kind, line, col)?,
        number(&s[6..8], kind, line, col)?,
    );

    if date.to_naive().is_none() {
        return Err(ParseError::new(kind, line, col).with_context(s.to_string()));
    }

    Ok(date)
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z]. A trailing `Z` wins over `tzid`.
///
/// ## Errors
/// Returns an error if the string is not a valid datetime format.
pub fn parse_datetime(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    let (date_str, time_str) = s
        .split_once('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;

    let date = parse_date(date_str, line, col)?;

    let (time_str, is_utc) = match time_str.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (time_str, false),
    };
    let time_col = col + date_str.len() + 1;
    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, time_col));
    }

    let kind = ParseErrorKind::InvalidTime;
    let hour: u8 = number(&time_str[0..2], kind, line, time_col)?;
    let minute: u8 = number(&time_str[2..4], kind, line, time_col)?;
    let second: u8 = number(&time_str[4..6], kind, line, time_col)?;

    // 60 is a leap second
    if hour > 23 || minute > 59 || second > 60 {
        return Err(ParseError::new(kind, line, time_col));
    }

    let form = match (is_utc, tzid) {
        (true, _) => DateTimeForm::Utc,
        (false, Some(tz)) => DateTimeForm::Zoned {
            tzid: tz.to_string(),
        },
        (false, None) => DateTimeForm::Floating,
    };

    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour,
        minute,
        second,
        form,
    })
}

/// Parses a comma-separated DATE list (EXDATE/RDATE with `VALUE=DATE`).
///
/// ## Errors
/// Returns an error if any element is not a valid date.
pub fn parse_date_list(s: &str, line: usize, col: usize) -> ParseResult<Vec<Date>> {
    s.split(',')
        .map(|v| parse_date(v.trim(), line, col))
        .collect()
}

/// Parses a comma-separated DATE-TIME list sharing one TZID.
///
/// ## Errors
/// Returns an error if any element is not a valid date-time.
pub fn parse_datetime_list(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<Vec<DateTime>> {
    s.split(',')
        .map(|v| parse_datetime(v.trim(), tzid, line, col))
        .collect()
}

/// Parses a RECUR (RRULE) value (RFC 5545 §3.3.10).
///
/// Unknown rule parts are ignored.
///
/// ## Errors
/// Returns an error if the string is not a valid recurrence rule.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let mut rrule = RRule::new();

    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(part.to_string())
        })?;
        parse_rrule_part(&mut rrule, key, value, line, col)?;
    }

    if rrule.freq.is_none() {
        return Err(ParseError::new(ParseErrorKind::InvalidRRule, line, col)
            .with_context("missing FREQ"));
    }

    Ok(rrule)
}

fn parse_rrule_part(
    rrule: &mut RRule,
    key: &str,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    let kind = ParseErrorKind::InvalidRRule;
    match key.to_ascii_uppercase().as_str() {
        "FREQ" => {
            rrule.freq = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        }
        "INTERVAL" => rrule.interval = Some(number(value, kind, line, col)?),
        "COUNT" => {
            if rrule.until.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, col));
            }
            rrule.count = Some(number(value, kind, line, col)?);
        }
        "UNTIL" => {
            if rrule.count.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, col));
            }
            rrule.until = Some(if value.contains('T') {
                RRuleUntil::DateTime(parse_datetime(value, None, line, col)?)
            } else {
                RRuleUntil::Date(parse_date(value, line, col)?)
            });
        }
        "WKST" => {
            rrule.wkst = Some(
                Weekday::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?,
            );
        }
        "BYSECOND" => rrule.by_second = parse_list(value, line, col)?,
        "BYMINUTE" => rrule.by_minute = parse_list(value, line, col)?,
        "BYHOUR" => rrule.by_hour = parse_list(value, line, col)?,
        "BYDAY" => {
            rrule.by_day = value
                .split(',')
                .map(|v| parse_weekday_num(v.trim(), line, col))
                .collect::<ParseResult<_>>()?;
        }
        "BYMONTHDAY" => rrule.by_monthday = parse_list(value, line, col)?,
        "BYYEARDAY" => rrule.by_yearday = parse_list(value, line, col)?,
        "BYWEEKNO" => rrule.by_weekno = parse_list(value, line, col)?,
        "BYMONTH" => rrule.by_month = parse_list(value, line, col)?,
        "BYSETPOS" => rrule.by_setpos = parse_list(value, line, col)?,
        other => tracing::trace!(part = other, "Ignoring unknown RRULE part"),
    }
    Ok(())
}

fn parse_list<T: FromStr>(s: &str, line: usize, col: usize) -> ParseResult<Vec<T>> {
    s.split(',')
        .map(|v| number(v.trim(), ParseErrorKind::InvalidRRule, line, col))
        .collect()
}

/// Parses a weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    let split = s
        .len()
        .checked_sub(2)
        .filter(|&i| s.is_char_boundary(i))
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;
    let (ordinal_str, weekday_str) = s.split_at(split);

    let weekday = Weekday::parse(weekday_str)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;

    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }

    let ordinal: i8 = number(ordinal_str, ParseErrorKind::InvalidRRule, line, col)?;
    WeekdayNum::nth(ordinal, weekday)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(',') => result.push(','),
            Some(';') => result.push(';'),
            Some('\\') | None => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
        }
    }

    result
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a valid integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    number(s.trim(), ParseErrorKind::InvalidInteger, line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_basic() {
        let date = parse_date("20260123", 1, 1).unwrap();
        assert_eq!(date, Date::new(2026, 1, 23));
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("2026012", 1, 1).is_err());
        assert!(parse_date("20261301", 1, 1).is_err());
        assert!(parse_date("20230229", 1, 1).is_err());
    }

    #[test]
    fn parse_datetime_forms() {
        let dt = parse_datetime("20260123T120000Z", Some("Europe/Paris"), 1, 1).unwrap();
        assert!(dt.is_utc());

        let dt = parse_datetime("20260123T120000", None, 1, 1).unwrap();
        assert!(dt.is_floating());

        let dt = parse_datetime("20260123T133000", Some("America/New_York"), 1, 1).unwrap();
        assert_eq!(dt.tzid(), Some("America/New_York"));
        assert_eq!((dt.hour, dt.minute), (13, 30));
    }

    #[test]
    fn parse_datetime_rejects_bad_time() {
        let err = parse_datetime("20260123T250000", None, 2, 9).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidTime);
        assert_eq!(err.column, 18);
    }

    #[test]
    fn parse_datetime_list_shares_tzid() {
        let list =
            parse_datetime_list("20240104T090000,20240106T090000", Some("Europe/Berlin"), 1, 1)
                .unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|dt| dt.tzid() == Some("Europe/Berlin")));
    }

    #[test]
    fn parse_rrule_basic() {
        let rrule = parse_rrule("FREQ=DAILY;COUNT=10", 1, 1).unwrap();
        assert_eq!(rrule.freq, Some(Frequency::Daily));
        assert_eq!(rrule.count, Some(10));
    }

    #[test]
    fn parse_rrule_monthly_nth() {
        let rrule = parse_rrule("FREQ=MONTHLY;BYDAY=-1FR,MO", 1, 1).unwrap();
        assert_eq!(rrule.by_day.len(), 2);
        assert_eq!(rrule.by_day[0].ordinal, Some(-1));
        assert_eq!(rrule.by_day[0].weekday, Weekday::Friday);
        assert_eq!(rrule.by_day[1].ordinal, None);
    }

    #[test]
    fn parse_rrule_until_forms() {
        let rrule = parse_rrule("FREQ=DAILY;UNTIL=20240110", 1, 1).unwrap();
        assert_eq!(rrule.until, Some(RRuleUntil::Date(Date::new(2024, 1, 10))));

        let rrule = parse_rrule("FREQ=DAILY;UNTIL=20240110T120000Z", 1, 1).unwrap();
        assert!(matches!(rrule.until, Some(RRuleUntil::DateTime(ref dt)) if dt.is_utc()));
    }

    #[test]
    fn parse_rrule_errors() {
        assert_eq!(
            parse_rrule("FREQ=DAILY;COUNT=10;UNTIL=20260131", 1, 1)
                .unwrap_err()
                .kind,
            ParseErrorKind::UntilCountConflict
        );
        assert_eq!(
            parse_rrule("FREQ=FORTNIGHTLY", 1, 1).unwrap_err().kind,
            ParseErrorKind::InvalidFrequency
        );
        assert_eq!(
            parse_rrule("COUNT=3", 1, 1).unwrap_err().kind,
            ParseErrorKind::InvalidRRule
        );
        assert!(parse_rrule("FREQ=WEEKLY;BYDAY=0MO", 1, 1).is_err());
    }

    #[test]
    fn unescape_text_basic() {
        assert_eq!(unescape_text("hello\\, world"), "hello, world");
        assert_eq!(unescape_text("line1\\nline2"), "line1\nline2");
        assert_eq!(unescape_text("back\\\\slash"), "back\\slash");
    }
}
