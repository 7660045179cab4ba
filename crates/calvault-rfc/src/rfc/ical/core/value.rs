//! iCalendar property value types (RFC 5545 §3.3).

use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::{DateTime, RRule};

/// DATE value (RFC 5545 §3.3.4).
///
/// A calendar date without time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    /// Creates a new date.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Converts to a `chrono` date, if the date exists.
    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    /// Converts from a `chrono` date.
    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        Some(Self {
            year: u16::try_from(date.year()).ok()?,
            month: u8::try_from(date.month()).ok()?,
            day: u8::try_from(date.day()).ok()?,
        })
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// Parsed value of a property. The raw string is preserved separately on
/// [`super::Property`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// CAL-ADDRESS value (typically mailto: URI).
    CalAddress(String),
    /// DATE value.
    Date(Date),
    /// Comma-separated DATE list (EXDATE/RDATE).
    DateList(Vec<Date>),
    /// DATE-TIME value.
    DateTime(DateTime),
    /// Comma-separated DATE-TIME list (EXDATE/RDATE).
    DateTimeList(Vec<DateTime>),
    /// INTEGER value.
    Integer(i32),
    /// RECUR value (recurrence rule).
    Recur(Box<RRule>),
    /// TEXT value (unescaped).
    Text(String),
    /// Unknown or unparsed value. Preserved for round-trip.
    Unknown(String),
}

impl Value {
    /// Returns this value as text, if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns this value as a calendar user address.
    #[must_use]
    pub fn as_cal_address(&self) -> Option<&str> {
        match self {
            Self::CalAddress(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as a date-time, if it is a date-time value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns this value as a date, if it is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Returns this value as a date list (EXDATE/RDATE with `VALUE=DATE`).
    #[must_use]
    pub fn as_date_list(&self) -> Option<&[Date]> {
        match self {
            Self::DateList(dates) => Some(dates),
            _ => None,
        }
    }

    /// Returns this value as a date-time list.
    #[must_use]
    pub fn as_datetime_list(&self) -> Option<&[DateTime]> {
        match self {
            Self::DateTimeList(dts) => Some(dts),
            _ => None,
        }
    }

    /// Returns this value as a recurrence rule, if it is a recur value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }
}
