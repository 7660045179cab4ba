//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use super::{Parameter, Value};

/// A raw content line as parsed from iCalendar text.
///
/// This is the low-level representation before value type resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string (after unfolding, before unescaping).
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a new content line.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            raw_value: value.into(),
        }
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        let name_upper = name.to_ascii_uppercase();
        self.params
            .iter()
            .find(|p| p.name == name_upper)
            .and_then(Parameter::value)
    }

    /// Returns the VALUE parameter if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value("VALUE")
    }

    /// Returns the TZID parameter if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value("TZID")
    }
}

/// A fully parsed iCalendar property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Parsed value.
    pub value: Value,
    /// Original raw value string (for round-trip).
    pub raw_value: String,
}

impl Property {
    /// Creates a property with a text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value_str = value.into();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Text(value_str.clone()),
            raw_value: value_str,
        }
    }

    /// Creates a property with an integer value.
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Integer(value),
            raw_value: value.to_string(),
        }
    }

    /// Creates a property with a calendar user address (`mailto:` URI).
    #[must_use]
    pub fn cal_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::CalAddress(address.clone()),
            raw_value: address,
        }
    }

    /// Creates a property with a datetime value.
    ///
    /// Zoned values get a matching TZID parameter.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: super::DateTime) -> Self {
        let raw = dt.to_string();
        let params = dt
            .tzid()
            .map(|tzid| vec![Parameter::tzid(tzid)])
            .unwrap_or_default();
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            value: Value::DateTime(dt),
            raw_value: raw,
        }
    }

    /// Creates a property with a date value.
    #[must_use]
    pub fn date(name: impl Into<String>, d: super::Date) -> Self {
        let raw = d.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: vec![Parameter::value_type("DATE")],
            value: Value::Date(d),
            raw_value: raw,
        }
    }

    /// Creates an RRULE-style property.
    #[must_use]
    pub fn recur(name: impl Into<String>, rule: super::RRule) -> Self {
        let raw = rule.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Recur(Box::new(rule)),
            raw_value: raw,
        }
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let name_upper = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == name_upper)
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        let p = self.get_param(name)?;
        p.value()
    }

    /// Sets a parameter, replacing any existing parameter with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Builder-style variant of [`Property::set_param`].
    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.set_param(param);
        self
    }

    /// Removes a parameter and returns it, if present.
    pub fn remove_param(&mut self, name: &str) -> Option<Parameter> {
        let name_upper = name.to_ascii_uppercase();
        let index = self.params.iter().position(|p| p.name == name_upper)?;
        Some(self.params.remove(index))
    }

    /// Returns the value as text if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Returns the value as an integer if it is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Returns the calendar user address, if this is an address value.
    #[must_use]
    pub fn as_cal_address(&self) -> Option<&str> {
        self.value.as_cal_address()
    }

    /// Returns the value as a datetime if it is a datetime value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&super::DateTime> {
        self.value.as_datetime()
    }

    /// Returns the value as a date if it is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<&super::Date> {
        self.value.as_date()
    }

    /// Returns the value as a recurrence rule if it is a recur value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&super::RRule> {
        self.value.as_recur()
    }
}
