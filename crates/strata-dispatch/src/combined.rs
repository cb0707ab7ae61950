//! Per-request composite of backend structure and store-held identity.

use std::collections::{BTreeMap, BTreeSet};

use strata_core::audit::AuditInfo;
use strata_core::tag::{self, IDENTITY_TAG_KEY};
use strata_connector::schema::Schema;
use strata_store::entity::SchemaEntity;

/// Combined view of one schema: the backend's structural metadata plus the
/// store's identity and audit, when a store row exists.
///
/// Never persisted; built per request and returned to the caller. The raw
/// backend properties are kept intact — hidden keys are tracked separately
/// so that masking stays a presentation choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedSchema {
    schema: Schema,
    entity: Option<SchemaEntity>,
    hidden_keys: BTreeSet<String>,
    imported: bool,
}

impl CombinedSchema {
    /// Wraps a backend view with no store component.
    #[must_use]
    pub fn of(schema: Schema) -> Self {
        Self {
            schema,
            entity: None,
            hidden_keys: BTreeSet::new(),
            imported: false,
        }
    }

    /// Attaches the store-held entity, if one exists.
    #[must_use]
    pub fn with_entity(mut self, entity: Option<SchemaEntity>) -> Self {
        self.entity = entity;
        self
    }

    /// Records which property keys the backend declares confidential.
    #[must_use]
    pub fn with_hidden_keys(mut self, hidden_keys: BTreeSet<String>) -> Self {
        self.hidden_keys = hidden_keys;
        self
    }

    /// Marks whether the store already reflects this schema.
    #[must_use]
    pub const fn with_imported(mut self, imported: bool) -> Self {
        self.imported = imported;
        self
    }

    /// Returns the backend's view, reserved keys included.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the store-held entity, if any.
    #[must_use]
    pub const fn entity(&self) -> Option<&SchemaEntity> {
        self.entity.as_ref()
    }

    /// Returns true if the store already reflects this schema.
    #[must_use]
    pub const fn imported(&self) -> bool {
        self.imported
    }

    /// Returns the hidden keys tracked for presentation-time masking.
    #[must_use]
    pub const fn hidden_keys(&self) -> &BTreeSet<String> {
        &self.hidden_keys
    }

    /// Returns the identity tag parsed from the backend properties, if any.
    #[must_use]
    pub fn identity_tag(&self) -> Option<u64> {
        tag::extract(&self.schema.properties)
    }

    /// Returns the properties fit for presentation: the backend's map minus
    /// the identity tag key and minus declared-hidden keys.
    #[must_use]
    pub fn presentable_properties(&self) -> BTreeMap<String, String> {
        self.schema
            .properties
            .iter()
            .filter(|(key, _)| {
                key.as_str() != IDENTITY_TAG_KEY && !self.hidden_keys.contains(*key)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the audit fields, preferring the store-held record.
    ///
    /// The store is authoritative for provenance; backend-held audit only
    /// shows through when no entity exists.
    #[must_use]
    pub fn audit(&self) -> Option<&AuditInfo> {
        self.entity
            .as_ref()
            .map(|e| &e.audit)
            .or(self.schema.audit.as_ref())
    }
}
