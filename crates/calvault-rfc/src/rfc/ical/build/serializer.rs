//! iCalendar serializer (RFC 5545).

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::rfc::ical::core::{Component, ComponentKind, Parameter, Property, Value};

/// Property order for VEVENT output. Unlisted names follow in input order.
const EVENT_ORDER: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "DURATION",
    "RRULE",
    "RDATE",
    "EXDATE",
    "RECURRENCE-ID",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "STATUS",
    "TRANSP",
    "ORGANIZER",
    "ATTENDEE",
    "COMMENT",
    "SEQUENCE",
];

const CALENDAR_ORDER: &[&str] = &["VERSION", "PRODID", "CALSCALE", "METHOD"];

const ALARM_ORDER: &[&str] = &["ACTION", "TRIGGER", "DESCRIPTION", "SUMMARY"];

/// Serializes a component, its properties and its children.
///
/// Output is deterministic: properties follow a fixed per-kind order, then
/// any remaining names in the order they were added.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut out = fold_line(&format!("BEGIN:{}", component.name));

    for prop in ordered_properties(component) {
        out.push_str(&serialize_property(prop));
    }
    for child in &component.children {
        out.push_str(&serialize_component(child));
    }

    out.push_str(&fold_line(&format!("END:{}", component.name)));
    out
}

/// Serializes `component` inside a minimal `VCALENDAR` envelope.
#[must_use]
pub fn serialize_wrapped(component: &Component, prod_id: &str) -> String {
    let mut calendar = Component::new(ComponentKind::Calendar)
        .with_property(Property::text("VERSION", "2.0"))
        .with_property(Property::text("PRODID", prod_id));
    calendar.add_child(component.clone());
    serialize_component(&calendar)
}

/// Serializes one property as a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in &prop.params {
        line.push(';');
        line.push_str(&serialize_parameter(param));
    }

    line.push(':');
    match &prop.value {
        Value::Text(text) => line.push_str(&escape_text(text)),
        _ => line.push_str(&prop.raw_value),
    }

    fold_line(&line)
}

fn serialize_parameter(param: &Parameter) -> String {
    let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
    format!("{}={}", param.name, values.join(","))
}

fn ordered_properties(component: &Component) -> Vec<&Property> {
    let order = match component.kind {
        Some(ComponentKind::Event) => EVENT_ORDER,
        Some(ComponentKind::Calendar) => CALENDAR_ORDER,
        Some(ComponentKind::Alarm) => ALARM_ORDER,
        _ => &[],
    };

    let mut ordered: Vec<&Property> = Vec::with_capacity(component.properties.len());
    for &name in order {
        ordered.extend(component.properties.iter().filter(|p| p.name == name));
    }
    ordered.extend(
        component
            .properties
            .iter()
            .filter(|p| !order.contains(&p.name.as_str())),
    );
    ordered
}
