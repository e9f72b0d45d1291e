//! Input types for the contact, search and purchase payloads.

/// A named group of contact fields, rendered as one `<Group_Tag>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

/// Ordered group-tag name to field map used for contact create and update.
///
/// Both groups and fields keep insertion order, which is the order they
/// appear in the generated XML. Adding a field to an existing group name
/// appends to that group instead of opening a second one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    groups: Vec<Section>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add several fields to a group at once.
    pub fn group<I, K, V>(mut self, name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in fields {
            self.insert(name, key, value);
        }
        self
    }

    pub fn field(mut self, group: &str, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(group, name, value);
        self
    }

    /// Set a field, replacing an earlier value for the same name in the
    /// same group.
    pub fn insert(&mut self, group: &str, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let idx = match self.groups.iter().position(|s| s.name == group) {
            Some(idx) => idx,
            None => {
                self.groups.push(Section {
                    name: group.to_string(),
                    fields: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let section = &mut self.groups[idx];
        match section.fields.iter_mut().find(|(key, _)| *key == name) {
            Some(field) => field.1 = value,
            None => section.fields.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.groups.iter()
    }
}

/// One search filter: `field op value`, e.g. `("Email", "=", "a@b.c")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    pub field: String,
    pub op: String,
    pub value: String,
}

impl Equation {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }
}
