//! Text and parameter escaping (RFC 5545 §3.3.11, RFC 6868).

/// Escapes a TEXT value. Carriage returns are dropped; line feeds become `\n`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | ',' | ';' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Renders a parameter value, quoting it when it holds a delimiter.
///
/// Quoted values use caret encoding for `^`, newlines and `"`.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    if !s.contains([':', ';', ',', '"', '\n']) {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '^' => out.push_str("^^"),
            '\n' => out.push_str("^n"),
            '"' => out.push_str("^'"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
