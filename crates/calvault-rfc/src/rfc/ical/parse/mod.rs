//! iCalendar text parsing.

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::{parse_component, parse_event};
pub use values::{parse_date, parse_datetime, parse_rrule, unescape_text};
