//! iCalendar core models (RFC 5545).
//!
//! The structured component model that decrypted event cards are parsed into.
//! Unknown properties and parameters survive a parse/serialize round trip.

mod component;
mod datetime;
mod parameter;
mod property;
mod rrule;
mod value;

pub use component::{Component, ComponentKind};
pub use datetime::{DateTime, DateTimeForm};
pub use parameter::Parameter;
pub use property::{ContentLine, Property};
pub use rrule::{Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};
pub use value::{Date, Value};
