//! iCalendar component types (RFC 5545 §3.4-3.6).

use super::Property;

/// Component kind for iCalendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    /// VEVENT component.
    Event,
    /// VALARM component (nested within VEVENT).
    Alarm,
    /// VTIMEZONE component.
    Timezone,
    /// Unknown/X-component.
    Unknown,
}

impl ComponentKind {
    /// Returns the string name for this component kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Alarm => "VALARM",
            Self::Timezone => "VTIMEZONE",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VALARM" => Self::Alarm,
            "VTIMEZONE" => Self::Timezone,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An iCalendar component.
///
/// Properties keep their order of appearance; a property name may occur more
/// than once (ATTENDEE, EXDATE).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    /// Component type/name.
    pub kind: Option<ComponentKind>,
    /// Original component name (preserved for X-components).
    pub name: String,
    /// Properties in order of appearance.
    pub properties: Vec<Property>,
    /// Nested sub-components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates a new component with the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind: Some(kind),
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a new component with a custom name (for X-components).
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        let kind = ComponentKind::parse(&name);
        Self {
            kind: Some(kind),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a VEVENT component.
    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    /// Creates a VALARM component.
    #[must_use]
    pub fn alarm() -> Self {
        Self::new(ComponentKind::Alarm)
    }

    /// Adds a property to this component.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Builder-style variant of [`Component::add_property`].
    #[must_use]
    pub fn with_property(mut self, prop: Property) -> Self {
        self.properties.push(prop);
        self
    }

    /// Removes and returns all properties with the given name.
    pub fn remove_properties(&mut self, name: &str) -> Vec<Property> {
        let name_upper = name.to_ascii_uppercase();
        let (removed, kept) = std::mem::take(&mut self.properties)
            .into_iter()
            .partition(|p| p.name == name_upper);
        self.properties = kept;
        removed
    }

    /// Adds a child component.
    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        let name_upper = name.to_ascii_uppercase();
        self.properties.iter().find(|p| p.name == name_upper)
    }

    /// Returns all properties with the given name.
    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&Property> {
        let name_upper = name.to_ascii_uppercase();
        self.properties
            .iter()
            .filter(|p| p.name == name_upper)
            .collect()
    }

    /// Returns whether at least one property with the given name exists.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// Returns the distinct property names in order of first appearance.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for prop in &self.properties {
            if !names.contains(&prop.name.as_str()) {
                names.push(&prop.name);
            }
        }
        names
    }

    /// Overlays `other` onto this component, property name by property name.
    ///
    /// Every property name present in `other` replaces all of this
    /// component's properties of that name; names absent from `other` are kept.
    /// Sub-components are replaced wholesale when `other` carries any.
    pub fn merge(&mut self, other: Component) {
        let incoming: Vec<String> = other
            .property_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.properties.retain(|p| !incoming.contains(&p.name));
        self.properties.extend(other.properties);

        if !other.children.is_empty() {
            self.children = other.children;
        }
        if self.kind.is_none() {
            self.kind = other.kind;
            self.name = other.name;
        }
    }

    /// Returns the UID property value if present.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property("UID")?.as_text()
    }

    /// Returns the SUMMARY property value if present.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property("SUMMARY")?.as_text()
    }

    /// Returns all ATTENDEE properties.
    #[must_use]
    pub fn attendees(&self) -> Vec<&Property> {
        self.get_properties("ATTENDEE")
    }

    /// Returns children of a specific kind.
    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children
            .iter()
            .filter(|c| c.kind == Some(kind))
            .collect()
    }

    /// Returns all VEVENT children.
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Event)
    }

    /// Returns all VALARM children.
    #[must_use]
    pub fn alarms(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Alarm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_kind_parse() {
        assert_eq!(ComponentKind::parse("VEVENT"), ComponentKind::Event);
        assert_eq!(ComponentKind::parse("valarm"), ComponentKind::Alarm);
        assert_eq!(ComponentKind::parse("X-CUSTOM"), ComponentKind::Unknown);
    }

    #[test]
    fn component_properties() {
        let mut event = Component::event();
        event.add_property(Property::text("UID", "test-uid-123"));
        event.add_property(Property::text("SUMMARY", "Test Event"));

        assert_eq!(event.uid(), Some("test-uid-123"));
        assert_eq!(event.summary(), Some("Test Event"));
        assert_eq!(event.property_names(), vec!["UID", "SUMMARY"]);
    }

    #[test]
    fn merge_is_right_biased() {
        let mut shared = Component::event()
            .with_property(Property::text("X-A", "1"))
            .with_property(Property::text("X-B", "2"));
        let calendar = Component::event()
            .with_property(Property::text("X-B", "3"))
            .with_property(Property::text("X-C", "4"));

        shared.merge(calendar);

        assert_eq!(shared.get_property("X-A").and_then(Property::as_text), Some("1"));
        assert_eq!(shared.get_property("X-B").and_then(Property::as_text), Some("3"));
        assert_eq!(shared.get_property("X-C").and_then(Property::as_text), Some("4"));
        assert_eq!(shared.get_properties("X-B").len(), 1);
    }

    #[test]
    fn merge_replaces_all_instances_of_a_name() {
        let mut base = Component::event()
            .with_property(Property::text("COMMENT", "a"))
            .with_property(Property::text("COMMENT", "b"));
        base.merge(Component::event().with_property(Property::text("COMMENT", "c")));

        let comments: Vec<_> = base
            .get_properties("COMMENT")
            .into_iter()
            .filter_map(Property::as_text)
            .collect();
        assert_eq!(comments, vec!["c"]);
    }

    #[test]
    fn merge_keeps_children_unless_replaced() {
        let mut base = Component::event();
        base.add_child(Component::alarm());
        base.merge(Component::event().with_property(Property::text("SUMMARY", "x")));
        assert_eq!(base.alarms().len(), 1);
    }

    #[test]
    fn remove_properties_returns_removed() {
        let mut event = Component::event()
            .with_property(Property::text("ATTENDEE", "mailto:a@example.com"))
            .with_property(Property::text("SUMMARY", "s"))
            .with_property(Property::text("ATTENDEE", "mailto:b@example.com"));
        let removed = event.remove_properties("attendee");
        assert_eq!(removed.len(), 2);
        assert_eq!(event.properties.len(), 1);
    }
}
