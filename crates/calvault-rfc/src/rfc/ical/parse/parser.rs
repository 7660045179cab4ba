//! iCalendar component parser (RFC 5545).

use std::iter::Peekable;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::{
    parse_date, parse_date_list, parse_datetime, parse_datetime_list, parse_integer, parse_rrule,
    unescape_text,
};
use crate::rfc::ical::core::{Component, ComponentKind, ContentLine, Property, Value};

/// Parses the first top-level component of an iCalendar text.
///
/// ## Errors
///
/// Returns an error if the input is empty, does not start with `BEGIN`, has
/// unbalanced `BEGIN`/`END` lines, or carries a malformed typed value.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_component(input: &str) -> ParseResult<Component> {
    let lines = split_lines(input);
    if lines.is_empty() {
        return Err(ParseError::new(ParseErrorKind::UnexpectedEof, 1, 1));
    }

    tracing::trace!(count = lines.len(), "Split lines");

    let content_lines: Vec<(usize, ContentLine)> = lines
        .into_iter()
        .map(|(line_num, line)| parse_content_line(&line, line_num).map(|cl| (line_num, cl)))
        .collect::<ParseResult<_>>()?;

    let mut iter = content_lines.into_iter().peekable();
    let (line_num, begin) = iter
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEof, 1, 1))?;

    if begin.name != "BEGIN" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
            .with_context(format!("found {}", begin.name)));
    }

    parse_body(&mut iter, line_num, &begin.raw_value.to_ascii_uppercase())
}

/// Parses a single VEVENT, accepting either a bare `VEVENT` or a
/// `VCALENDAR` wrapping one.
///
/// When the wrapper holds several events, the first one is returned.
///
/// ## Errors
///
/// Returns an error if the text does not parse or holds no VEVENT.
pub fn parse_event(input: &str) -> ParseResult<Component> {
    let root = parse_component(input)?;
    match root.kind {
        Some(ComponentKind::Event) => Ok(root),
        Some(ComponentKind::Calendar) => root
            .children
            .into_iter()
            .find(|c| c.kind == Some(ComponentKind::Event))
            .ok_or_else(|| ParseError::new(ParseErrorKind::MissingEvent, 1, 1)),
        _ => Err(ParseError::new(ParseErrorKind::MissingEvent, 1, 1)
            .with_context(format!("root component is {}", root.name))),
    }
}

/// Parses properties and nested components up to the matching `END`.
fn parse_body(
    iter: &mut Peekable<impl Iterator<Item = (usize, ContentLine)>>,
    begin_line_num: usize,
    component_name: &str,
) -> ParseResult<Component> {
    let mut component = Component::custom(component_name);
    let mut last_line_num = begin_line_num;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(
                ParseError::new(ParseErrorKind::MissingEnd, last_line_num, 1)
                    .with_context(format!("missing END:{component_name}")),
            );
        };
        last_line_num = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let nested_name = content_line.raw_value.to_ascii_uppercase();
                let nested = parse_body(iter, line_num, &nested_name)?;
                component.add_child(nested);
            }
            "END" => {
                let end_name = content_line.raw_value.to_ascii_uppercase();
                if end_name != component_name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{component_name}, got END:{end_name}"
                            )),
                    );
                }
                return Ok(component);
            }
            _ => component.add_property(parse_property(content_line, line_num)?),
        }
    }
}

/// Parses a property from a content line, resolving the value type.
fn parse_property(cl: ContentLine, line_num: usize) -> ParseResult<Property> {
    let value = parse_value(&cl, line_num).map_err(|e| match e.context {
        Some(_) => e,
        None => e.with_context(cl.name.clone()),
    })?;

    Ok(Property {
        name: cl.name,
        params: cl.params,
        value,
        raw_value: cl.raw_value,
    })
}

/// Resolves the typed value of a content line.
///
/// An explicit `VALUE` parameter wins over the property default. Value
/// types this crate does not model are kept raw.
fn parse_value(cl: &ContentLine, line_num: usize) -> ParseResult<Value> {
    let raw = cl.raw_value.as_str();
    let tzid = cl.tzid();
    // Values start after the name and parameters; report at column 1.
    let col = 1;

    let explicit = cl.value_type().map(str::to_ascii_uppercase);
    let is_date = explicit.as_deref() == Some("DATE");

    let value = match (cl.name.as_str(), explicit.as_deref()) {
        (_, Some(other)) if !matches!(
            other,
            "DATE" | "DATE-TIME" | "TEXT" | "CAL-ADDRESS" | "INTEGER" | "RECUR"
        ) => {
            Value::Unknown(raw.to_string())
        }
        ("DTSTART" | "DTEND" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "RECURRENCE-ID", _) => {
            if is_date || (raw.len() == 8 && !raw.contains('T')) {
                Value::Date(parse_date(raw, line_num, col)?)
            } else {
                Value::DateTime(parse_datetime(raw, tzid, line_num, col)?)
            }
        }
        ("EXDATE" | "RDATE", _) => {
            if raw.contains('/') {
                Value::Unknown(raw.to_string())
            } else if is_date || !raw.contains('T') {
                Value::DateList(parse_date_list(raw, line_num, col)?)
            } else {
                Value::DateTimeList(parse_datetime_list(raw, tzid, line_num, col)?)
            }
        }
        ("RRULE", _) => Value::Recur(Box::new(parse_rrule(raw, line_num, col)?)),
        ("ATTENDEE" | "ORGANIZER", _) => Value::CalAddress(raw.to_string()),
        ("SEQUENCE" | "PRIORITY", _) => Value::Integer(parse_integer(raw, line_num, col)?),
        ("DURATION" | "TRIGGER" | "URL" | "GEO", _) => Value::Unknown(raw.to_string()),
        _ => Value::Text(unescape_text(raw)),
    };

    Ok(value)
}
