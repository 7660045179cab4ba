//! iCalendar (RFC 5545) support for calendar event cards.
//!
//! - `core`: structured component model
//! - `parse`: content-line parser for card payloads
//! - `build`: serializer used when sealing cards
//! - `expand`: timezone resolution for recurrence expansion

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;
