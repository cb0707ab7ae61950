//! Backend-held schema metadata and the change set applied to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use strata_core::audit::AuditInfo;

/// A schema as the backend returns it.
///
/// The backend is authoritative for structure and properties. Properties may
/// include the reserved identity tag key; the combined-view builder strips
/// it before presentation. Some backends also carry their own audit fields,
/// which the import path copies when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Leaf name of the schema.
    pub name: String,

    /// Optional free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Backend-held properties, reserved keys included.
    pub properties: BTreeMap<String, String>,

    /// Backend-held provenance, when the backend records any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInfo>,
}

impl Schema {
    /// Creates a schema view with the given name and properties.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        comment: Option<String>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            comment,
            properties,
            audit: None,
        }
    }

    /// Returns a copy carrying the given backend audit fields.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditInfo) -> Self {
        self.audit = Some(audit);
        self
    }
}

/// A single alteration applied to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SchemaChange {
    /// Sets a property, adding or replacing it.
    SetProperty {
        /// Property key.
        name: String,
        /// New value.
        value: String,
    },
    /// Removes a property if present.
    RemoveProperty {
        /// Property key.
        name: String,
    },
    /// Replaces the comment.
    UpdateComment {
        /// New comment, empty to clear.
        comment: String,
    },
    /// Renames the schema.
    ///
    /// Not supported by the dispatcher; rejected before any backend or
    /// store call. Present so callers get a typed rejection instead of a
    /// silent drop.
    Rename {
        /// Requested new leaf name.
        new_name: String,
    },
}

impl SchemaChange {
    /// Returns the property key this change touches, if any.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        match self {
            Self::SetProperty { name, .. } | Self::RemoveProperty { name } => Some(name),
            Self::UpdateComment { .. } | Self::Rename { .. } => None,
        }
    }

    /// Returns true for the unsupported rename change.
    #[must_use]
    pub const fn is_rename(&self) -> bool {
        matches!(self, Self::Rename { .. })
    }
}
