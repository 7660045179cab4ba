//! iCalendar parameter types (RFC 5545 §3.2).

/// A single iCalendar property parameter.
///
/// For example: `ATTENDEE;PARTSTAT=ACCEPTED;CN=Jane:mailto:jane@example.com`
/// carries the parameters `PARTSTAT` and `CN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values. Most parameters have one value, but some
    /// (like MEMBER) can have multiple comma-separated values.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a new parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a new parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first (and usually only) value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns whether the parameter has the specified value (case-insensitive).
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Creates a TZID parameter.
    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new("TZID", tzid)
    }

    /// Creates a VALUE parameter.
    #[must_use]
    pub fn value_type(value_type: impl Into<String>) -> Self {
        Self::new("VALUE", value_type)
    }

    /// Creates a CN (common name) parameter.
    #[must_use]
    pub fn cn(name: impl Into<String>) -> Self {
        Self::new("CN", name)
    }

    /// Creates a PARTSTAT (participation status) parameter.
    #[must_use]
    pub fn partstat(status: impl Into<String>) -> Self {
        Self::new("PARTSTAT", status)
    }

    /// Creates an RSVP parameter.
    #[must_use]
    pub fn rsvp(rsvp: bool) -> Self {
        Self::new("RSVP", if rsvp { "TRUE" } else { "FALSE" })
    }
}
