//! Placeholder resolution

use std::fmt;
use std::str::FromStr;

use dxq_shared::constants::PLACEHOLDER_SEPARATOR;
use dxq_shared::Value;
use serde::{Deserialize, Serialize};

use crate::data::DataSource;
use crate::error::FilterError;

/// What to do when the entity exists but the attribute does not
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingAttribute {
    /// Use the first attribute value of the record
    #[default]
    FirstProperty,
    /// Leave the placeholder unresolved
    Unresolved,
}

impl MissingAttribute {
    /// Kebab-case name, as used in config files and flags
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MissingAttribute::FirstProperty => "first-property",
            MissingAttribute::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for MissingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingAttribute {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-property" | "first" => Ok(MissingAttribute::FirstProperty),
            "unresolved" | "none" => Ok(MissingAttribute::Unresolved),
            _ => Err(FilterError::InvalidOption {
                option: "missing_attribute".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Outcome of resolving one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The data map supplied a value (possibly null)
    Resolved(Value),
    /// Nothing to resolve against
    Unresolved,
}

impl Resolution {
    /// The resolved value, or the placeholder spelled back as `{name}`
    #[must_use]
    pub fn into_value(self, name: &str) -> Value {
        match self {
            Resolution::Resolved(value) => value,
            Resolution::Unresolved => Value::String(format!("{{{name}}}")),
        }
    }

    /// True if a value was found
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Resolves `Entity.Attribute` names against a data source
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a, D: DataSource + ?Sized> {
    data: &'a D,
    missing_attribute: MissingAttribute,
}

impl<'a, D: DataSource + ?Sized> Resolver<'a, D> {
    /// Create a resolver
    pub fn new(data: &'a D, missing_attribute: MissingAttribute) -> Self {
        Self {
            data,
            missing_attribute,
        }
    }

    /// Resolve a placeholder name.
    ///
    /// The name splits at its first `.`; everything after it is the
    /// attribute. An entity that is absent or has no records leaves the
    /// placeholder unresolved. A missing attribute follows the
    /// [`MissingAttribute`] policy.
    pub fn resolve(&self, name: &str) -> Resolution {
        let (entity, attribute) = match name.split_once(PLACEHOLDER_SEPARATOR) {
            Some((entity, attribute)) => (entity, Some(attribute)),
            None => (name, None),
        };

        let Some(record) = self.data.record(entity) else {
            log::trace!("placeholder {{{name}}}: no record for entity {entity}");
            return Resolution::Unresolved;
        };

        if let Some(value) = attribute.and_then(|attr| record.get(attr)) {
            return Resolution::Resolved(value.clone());
        }

        match self.missing_attribute {
            MissingAttribute::FirstProperty => match record.values().next() {
                Some(value) => {
                    log::trace!("placeholder {{{name}}}: attribute missing, using first property");
                    Resolution::Resolved(value.clone())
                }
                None => Resolution::Unresolved,
            },
            MissingAttribute::Unresolved => Resolution::Unresolved,
        }
    }

    /// Resolve and fall back to the `{name}` spelling
    pub fn resolve_value(&self, name: &str) -> Value {
        self.resolve(name).into_value(name)
    }
}
