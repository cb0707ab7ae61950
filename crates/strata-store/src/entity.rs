//! The schema entity: identity and audit for one schema.

use serde::{Deserialize, Serialize};

use strata_core::audit::AuditInfo;
use strata_core::error::{Error, Result};
use strata_core::ident::{NameIdent, Namespace};

/// Identity and audit record for a schema.
///
/// Keyed in the store by full name, with a secondary index by id. The id is
/// immutable once assigned; name and namespace only change through
/// store-level re-keying during import after an external rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntity {
    /// Stable internal id.
    pub id: u64,

    /// Leaf name of the schema.
    pub name: String,

    /// Namespace prefix (`[metalake, catalog]`).
    pub namespace: Namespace,

    /// Creator and modifier provenance.
    pub audit: AuditInfo,
}

impl SchemaEntity {
    /// Creates a new builder for constructing schema entities.
    #[must_use]
    pub fn builder() -> SchemaEntityBuilder {
        SchemaEntityBuilder::default()
    }

    /// Returns the full name this entity is keyed by.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the stored name is not a valid
    /// path level.
    pub fn ident(&self) -> Result<NameIdent> {
        NameIdent::new(self.namespace.clone(), self.name.clone())
    }
}

/// Builder for [`SchemaEntity`].
#[derive(Debug, Default)]
pub struct SchemaEntityBuilder {
    id: Option<u64>,
    name: Option<String>,
    namespace: Option<Namespace>,
    audit: Option<AuditInfo>,
}

impl SchemaEntityBuilder {
    /// Sets the internal id.
    #[must_use]
    pub const fn id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the leaf name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the namespace prefix.
    #[must_use]
    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Sets the audit info.
    #[must_use]
    pub fn audit(mut self, audit: AuditInfo) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Builds the entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if a required field is missing.
    pub fn build(self) -> Result<SchemaEntity> {
        let missing =
            |field: &str| Error::illegal_argument(format!("schema entity missing {field}"));
        Ok(SchemaEntity {
            id: self.id.ok_or_else(|| missing("id"))?,
            name: self.name.ok_or_else(|| missing("name"))?,
            namespace: self.namespace.ok_or_else(|| missing("namespace"))?,
            audit: self.audit.ok_or_else(|| missing("audit"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> SchemaEntity {
        SchemaEntity::builder()
            .id(42)
            .name("sales")
            .namespace(Namespace::of(["lake", "pg"]).unwrap())
            .audit(AuditInfo::created_by("alice"))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_all_fields() {
        let err = SchemaEntity::builder().id(1).build().unwrap_err();
        assert!(err.to_string().contains("missing name"));
    }

    #[test]
    fn ident_joins_namespace_and_name() {
        assert_eq!(entity().ident().unwrap().to_string(), "lake.pg.sales");
    }

    #[test]
    fn serde_roundtrip_preserves_identity() {
        let entity = entity();
        let json = serde_json::to_string(&entity).unwrap();
        let parsed: SchemaEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(entity, parsed);
        assert!(json.contains("\"id\":42"));
    }
}
