//! Content line lexer for iCalendar (RFC 5545 §3.1).

use std::iter::Peekable;
use std::str::CharIndices;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

type Cursor<'a> = Peekable<CharIndices<'a>>;

/// Splits input into unfolded content lines, tagged with their 1-based
/// line number.
///
/// Accepts CRLF and bare LF. A line starting with SP or HTAB continues the
/// previous one; the fold whitespace is dropped and nothing is inserted.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        match line.strip_prefix([' ', '\t']) {
            Some(continuation) => match lines.last_mut() {
                Some((_, prev)) => prev.push_str(continuation),
                None => lines.push((i + 1, continuation.to_string())),
            },
            None => lines.push((i + 1, line.to_string())),
        }
    }

    lines
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the line is malformed or contains invalid characters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut chars = line.char_indices().peekable();

    let name_end = loop {
        match chars.peek() {
            Some(&(i, ';' | ':')) => break i,
            Some(&(i, c)) if !c.is_ascii_alphanumeric() && c != '-' => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidPropertyName,
                    line_num,
                    i + 1,
                ));
            }
            Some(_) => {
                chars.next();
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    };

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = line[..name_end].to_ascii_uppercase();
    let mut params = Vec::new();

    // Separator after the name: ';' opens a parameter list, ':' the value.
    let value_start = match chars.next() {
        Some((i, ':')) => i + 1,
        _ => loop {
            let (param, colon) = parse_parameter(&mut chars, line, line_num)?;
            params.push(param);
            if let Some(i) = colon {
                break i + 1;
            }
        },
    };

    Ok(ContentLine {
        name,
        params,
        raw_value: line[value_start..].to_string(),
    })
}

/// Parses one `NAME=value[,value]` parameter.
///
/// Returns the parameter and, when the parameter list ended, the byte offset
/// of the ':' that starts the value.
fn parse_parameter(
    chars: &mut Cursor<'_>,
    line: &str,
    line_num: usize,
) -> ParseResult<(Parameter, Option<usize>)> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| i);

    let name_end = loop {
        match chars.next() {
            Some((i, '=')) => break i,
            Some((_, c)) if c.is_ascii_alphanumeric() || c == '-' => {}
            Some((i, _)) => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidParameter,
                    line_num,
                    i + 1,
                ));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    };

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = &line[start..name_end];
    let mut values = Vec::new();
    loop {
        values.push(parse_param_value(chars, line, line_num)?);

        match chars.next() {
            Some((_, ',')) => {}
            Some((_, ';')) => return Ok((Parameter::with_values(param_name, values), None)),
            Some((i, ':')) => return Ok((Parameter::with_values(param_name, values), Some(i))),
            Some((i, c)) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, i + 1)
                        .with_context(format!("unexpected character '{c}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value, quoted or bare.
///
/// Quoted values honour RFC 6868 caret escapes.
fn parse_param_value(chars: &mut Cursor<'_>, line: &str, line_num: usize) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    if first != '"' {
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if matches!(c, ',' | ';' | ':') {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        return Ok(line[start..end].to_string());
    }

    chars.next();
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(value),
            '^' => match chars.peek().map(|&(_, next)| next) {
                Some('^') => {
                    value.push('^');
                    chars.next();
                }
                Some('n') => {
                    value.push('\n');
                    chars.next();
                }
                Some('\'') => {
                    value.push('"');
                    chars.next();
                }
                _ => value.push('^'),
            },
            _ => value.push(c),
        }
    }

    Err(ParseError::new(
        ParseErrorKind::UnclosedQuote,
        line_num,
        start + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_unfolds_continuations() {
        let input = "DESCRIPTION:This is a long\r\n  description\r\nSUMMARY:x\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "DESCRIPTION:This is a long description".to_string()));
        assert_eq!(lines[1], (3, "SUMMARY:x".to_string()));
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("SUMMARY:Team Meeting", 1).unwrap();
        assert_eq!(result.name, "SUMMARY");
        assert!(result.params.is_empty());
        assert_eq!(result.raw_value, "Team Meeting");
    }

    #[test]
    fn parse_line_with_params() {
        let result =
            parse_content_line("DTSTART;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(result.name, "DTSTART");
        assert_eq!(result.tzid(), Some("America/New_York"));
        assert_eq!(result.raw_value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_quoted_param_and_colon_in_value() {
        let line = "ATTENDEE;CN=\"Doe, Jane\";X-PM-TOKEN=abc:mailto:jane@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.get_param_value("CN"), Some("Doe, Jane"));
        assert_eq!(result.get_param_value("X-PM-TOKEN"), Some("abc"));
        assert_eq!(result.raw_value, "mailto:jane@example.com");
    }

    #[test]
    fn parse_line_with_multiple_param_values() {
        let line = "ATTENDEE;ROLE=REQ-PARTICIPANT,OPT-PARTICIPANT:mailto:test@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(
            result.params[0].values,
            vec!["REQ-PARTICIPANT".to_string(), "OPT-PARTICIPANT".to_string()]
        );
    }

    #[test]
    fn parse_line_with_caret_encoding() {
        let line = "ATTENDEE;CN=\"Test^nName\":mailto:test@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.params[0].value(), Some("Test\nName"));
    }

    #[test]
    fn parse_line_with_empty_value() {
        let result = parse_content_line("COMMENT;LANGUAGE=en:", 1).unwrap();
        assert_eq!(result.raw_value, "");
    }

    #[test]
    fn parse_line_unclosed_quote() {
        let err = parse_content_line("ATTENDEE;CN=\"Unclosed:mailto:x@example.com", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
    }

    #[test]
    fn parse_line_missing_colon() {
        let err = parse_content_line("INVALID", 4).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
        assert_eq!(err.line, 4);
    }
}
