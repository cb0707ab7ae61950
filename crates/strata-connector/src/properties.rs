//! Declared property metadata and validation.
//!
//! Each connector declares the property keys its backend understands:
//! whether they are required at creation, immutable afterwards, hidden from
//! end users, or reserved for the system. The dispatcher validates caller
//! input against these declarations before any backend call, so invalid
//! properties fail fast without side effects.

use std::collections::{BTreeMap, BTreeSet};

use strata_core::error::{Error, Result};
use strata_core::tag::IDENTITY_TAG_KEY;

use crate::schema::SchemaChange;

/// Declaration of one property key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    /// The property key.
    pub name: String,
    /// Must be supplied at creation.
    pub required: bool,
    /// Cannot be set or removed after creation.
    pub immutable: bool,
    /// Never presented to end users.
    pub hidden: bool,
    /// Owned by the system; callers may not set it at all.
    pub reserved: bool,
}

impl PropertyEntry {
    /// Declares an ordinary optional, mutable, visible property.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            immutable: false,
            hidden: false,
            reserved: false,
        }
    }

    /// Marks the property as required at creation.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the property as immutable after creation.
    #[must_use]
    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Marks the property as hidden from end users.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks the property as reserved for the system.
    #[must_use]
    pub const fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }
}

/// The full property declaration set of one connector scope.
#[derive(Debug, Clone, Default)]
pub struct PropertiesMetadata {
    entries: BTreeMap<String, PropertyEntry>,
    /// Whether keys outside the declared set are accepted and passed through.
    allow_undeclared: bool,
}

impl PropertiesMetadata {
    /// Metadata accepting any property key (backends without declarations).
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            entries: BTreeMap::new(),
            allow_undeclared: true,
        }
    }

    /// Metadata accepting only the given declared entries.
    #[must_use]
    pub fn declared(entries: impl IntoIterator<Item = PropertyEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            allow_undeclared: false,
        }
    }

    /// Validates caller-supplied properties for a create operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] on reserved keys, undeclared keys
    /// (unless undeclared keys are allowed), or missing required keys.
    pub fn validate_create(&self, properties: &BTreeMap<String, String>) -> Result<()> {
        for key in properties.keys() {
            self.check_settable(key)?;
        }
        for entry in self.entries.values() {
            if entry.required && !properties.contains_key(&entry.name) {
                return Err(Error::illegal_argument(format!(
                    "required property '{}' is missing",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Validates the property-touching changes of an alter operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] on reserved, immutable, or
    /// undeclared keys.
    pub fn validate_alter(&self, changes: &[SchemaChange]) -> Result<()> {
        for change in changes {
            let Some(key) = change.property_name() else {
                continue;
            };
            self.check_settable(key)?;
            if self.entries.get(key).is_some_and(|e| e.immutable) {
                return Err(Error::illegal_argument(format!(
                    "property '{key}' is immutable"
                )));
            }
        }
        Ok(())
    }

    /// Returns the declared-hidden keys present in `properties`.
    ///
    /// The identity tag key is always treated as hidden regardless of
    /// declarations; it is system-owned.
    #[must_use]
    pub fn hidden_keys(&self, properties: &BTreeMap<String, String>) -> BTreeSet<String> {
        properties
            .keys()
            .filter(|key| {
                key.as_str() == IDENTITY_TAG_KEY
                    || self.entries.get(*key).is_some_and(|e| e.hidden)
            })
            .cloned()
            .collect()
    }

    fn check_settable(&self, key: &str) -> Result<()> {
        if key == IDENTITY_TAG_KEY {
            return Err(Error::illegal_argument(format!(
                "property '{key}' is reserved"
            )));
        }
        match self.entries.get(key) {
            Some(entry) if entry.reserved => Err(Error::illegal_argument(format!(
                "property '{key}' is reserved"
            ))),
            Some(_) => Ok(()),
            None if self.allow_undeclared => Ok(()),
            None => Err(Error::illegal_argument(format!(
                "property '{key}' is not defined"
            ))),
        }
    }
}
