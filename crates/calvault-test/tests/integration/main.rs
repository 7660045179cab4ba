//! End-to-end tests of the calendar envelope: sealing, opening, merging and
//! expanding events through the mock capability.

mod assembly;
mod fail_closed;
mod helpers;
mod occurrences;
mod personal_part;
mod round_trip;
mod session_keys;
