pub mod calendar;
pub mod crypto;
pub mod error;
