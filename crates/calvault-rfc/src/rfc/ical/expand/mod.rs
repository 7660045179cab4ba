//! Timezone conversion used by recurrence expansion.

mod timezone;

pub use timezone::{
    ConversionError, TimeZoneResolver, convert_from_utc, convert_to_utc, datetime_to_utc,
    normalize_tzid,
};
