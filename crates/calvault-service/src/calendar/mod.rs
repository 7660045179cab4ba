//! Encrypted calendar event envelopes.
//!
//! An event travels as several cards: a shared part readable by everyone
//! the event is shared with, a calendar part scoped to the owning calendar,
//! an attendee part, and optional per-member personal parts. This module
//! verifies, decrypts and merges them back into one VEVENT, seals a VEVENT
//! into cards, and expands recurring events into occurrences.

pub mod attendees;
pub mod card;
pub mod decrypt;
pub mod deserialize;
pub mod invitation;
pub mod recurrence;
pub mod serialize;

pub use card::{
    AttendeeClear, AttendeeStatus, CalendarCard, CalendarEvent, CardKind, CardPart, PersonalCard,
};
pub use recurrence::{Occurrence, OccurrenceCache, RecurrenceExpander, get_occurrences_between};
