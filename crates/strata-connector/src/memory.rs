//! In-memory connector for tests and embedded use.
//!
//! Simulates the backend behaviors the dispatcher has to absorb: managed
//! capability, backends that refuse to round-trip system properties, and
//! external renames performed behind the service's back.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use strata_core::audit::AuditInfo;
use strata_core::error::{Error, Result};
use strata_core::ident::{NameIdent, Namespace};
use strata_core::tag::IDENTITY_TAG_KEY;

use crate::capability::{Capability, Scope};
use crate::ops::{Connector, SchemaOps};
use crate::properties::PropertiesMetadata;
use crate::schema::{Schema, SchemaChange};

/// In-memory backend connector.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    state: RwLock<State>,
    capability: Capability,
    properties_metadata: PropertiesMetadata,
    /// When true, writes strip system-injected properties, simulating a
    /// backend that silently drops keys it does not recognize.
    drops_system_properties: bool,
    /// Principal stamped on backend-held audit fields, when the simulated
    /// backend records provenance of its own.
    backend_principal: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    schemas: BTreeMap<String, Schema>,
    non_empty: BTreeSet<String>,
}

impl MemoryConnector {
    /// Creates a mirrored connector with permissive property metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties_metadata: PropertiesMetadata::permissive(),
            ..Self::default()
        }
    }

    /// Marks the schema scope as managed: this backend is the store of
    /// record and the dispatcher must not mirror its schemas.
    #[must_use]
    pub fn managed(mut self) -> Self {
        self.capability = self.capability.managed_at(Scope::Schema);
        self
    }

    /// Replaces the declared property metadata.
    #[must_use]
    pub fn with_properties_metadata(mut self, metadata: PropertiesMetadata) -> Self {
        self.properties_metadata = metadata;
        self
    }

    /// Makes the backend strip system-injected properties on write.
    #[must_use]
    pub const fn drop_system_properties(mut self) -> Self {
        self.drops_system_properties = true;
        self
    }

    /// Makes the backend record its own audit fields under the given
    /// principal.
    #[must_use]
    pub fn with_backend_audit(mut self, principal: impl Into<String>) -> Self {
        self.backend_principal = Some(principal.into());
        self
    }

    /// Simulates an external rename performed directly against the backend.
    ///
    /// Properties, the identity tag included, are preserved — the behavior
    /// of backends that round-trip unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSchema`] if the schema does not exist.
    pub fn rename_externally(&self, ident: &NameIdent, new_name: &str) -> Result<()> {
        let new_ident = NameIdent::new(ident.namespace().clone(), new_name)?;
        let mut state = self.write_state()?;
        let mut schema = state
            .schemas
            .remove(&ident.to_string())
            .ok_or_else(|| Error::no_such_schema(ident))?;
        schema.name = new_name.to_string();
        state.schemas.insert(new_ident.to_string(), schema);
        Ok(())
    }

    /// Marks a schema as holding objects, so non-cascade drops fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSchema`] if the schema does not exist.
    pub fn mark_non_empty(&self, ident: &NameIdent) -> Result<()> {
        let mut state = self.write_state()?;
        let key = ident.to_string();
        if !state.schemas.contains_key(&key) {
            return Err(Error::no_such_schema(ident));
        }
        state.non_empty.insert(key);
        Ok(())
    }

    /// Returns the raw backend view of a schema, tag and all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSchema`] if the schema does not exist.
    pub fn raw_schema(&self, ident: &NameIdent) -> Result<Schema> {
        self.read_state()?
            .schemas
            .get(&ident.to_string())
            .cloned()
            .ok_or_else(|| Error::no_such_schema(ident))
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| Error::Internal {
            message: "connector lock poisoned".into(),
        })
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| Error::Internal {
            message: "connector lock poisoned".into(),
        })
    }

    fn filter_properties(&self, properties: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        if self.drops_system_properties {
            properties
                .iter()
                .filter(|(k, _)| k.as_str() != IDENTITY_TAG_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        } else {
            properties.clone()
        }
    }
}

#[async_trait]
impl SchemaOps for MemoryConnector {
    async fn list_schemas(&self, namespace: &Namespace) -> Result<Vec<NameIdent>> {
        let state = self.read_state()?;
        let prefix = format!("{namespace}.");
        let mut idents = Vec::new();
        for key in state.schemas.keys() {
            if let Some(leaf) = key.strip_prefix(&prefix) {
                if !leaf.contains('.') {
                    idents.push(NameIdent::new(namespace.clone(), leaf)?);
                }
            }
        }
        Ok(idents)
    }

    async fn create_schema(
        &self,
        ident: &NameIdent,
        comment: Option<&str>,
        properties: &BTreeMap<String, String>,
    ) -> Result<Schema> {
        let mut state = self.write_state()?;
        let key = ident.to_string();
        if state.schemas.contains_key(&key) {
            return Err(Error::SchemaAlreadyExists { ident: key });
        }

        let mut schema = Schema::new(
            ident.name(),
            comment.map(ToString::to_string),
            self.filter_properties(properties),
        );
        if let Some(principal) = &self.backend_principal {
            schema = schema.with_audit(AuditInfo::created_by(principal));
        }
        state.schemas.insert(key, schema.clone());
        Ok(schema)
    }

    async fn load_schema(&self, ident: &NameIdent) -> Result<Schema> {
        self.read_state()?
            .schemas
            .get(&ident.to_string())
            .cloned()
            .ok_or_else(|| Error::no_such_schema(ident))
    }

    async fn alter_schema(&self, ident: &NameIdent, changes: &[SchemaChange]) -> Result<Schema> {
        let mut state = self.write_state()?;
        let key = ident.to_string();
        let mut schema = state
            .schemas
            .remove(&key)
            .ok_or_else(|| Error::no_such_schema(ident))?;

        let mut new_key = key;
        for change in changes {
            match change {
                SchemaChange::SetProperty { name, value } => {
                    if !(self.drops_system_properties && name == IDENTITY_TAG_KEY) {
                        schema.properties.insert(name.clone(), value.clone());
                    }
                }
                SchemaChange::RemoveProperty { name } => {
                    schema.properties.remove(name);
                }
                SchemaChange::UpdateComment { comment } => {
                    schema.comment = if comment.is_empty() {
                        None
                    } else {
                        Some(comment.clone())
                    };
                }
                SchemaChange::Rename { new_name } => {
                    schema.name.clone_from(new_name);
                    new_key = NameIdent::new(ident.namespace().clone(), new_name)?.to_string();
                }
            }
        }

        if let Some(principal) = &self.backend_principal {
            let audit = schema
                .audit
                .take()
                .map_or_else(|| AuditInfo::created_by(principal), |a| a.modified_by(principal));
            schema.audit = Some(audit);
        }
        state.schemas.insert(new_key, schema.clone());
        Ok(schema)
    }

    async fn drop_schema(&self, ident: &NameIdent, cascade: bool) -> Result<bool> {
        let mut state = self.write_state()?;
        let key = ident.to_string();
        if !state.schemas.contains_key(&key) {
            return Ok(false);
        }
        if state.non_empty.contains(&key) && !cascade {
            return Err(Error::NonEmptySchema { ident: key });
        }
        state.schemas.remove(&key);
        state.non_empty.remove(&key);
        Ok(true)
    }
}

impl Connector for MemoryConnector {
    fn schema_ops(&self) -> &dyn SchemaOps {
        self
    }

    fn schema_properties_metadata(&self) -> &PropertiesMetadata {
        &self.properties_metadata
    }

    fn capability(&self) -> &Capability {
        &self.capability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn create_load_list_drop_cycle() {
        let connector = MemoryConnector::new();
        let ident = NameIdent::schema("lake", "mem", "s1");

        let created = connector
            .create_schema(&ident, Some("c"), &props(&[("k", "v")]))
            .await
            .unwrap();
        assert_eq!(created.name, "s1");
        assert_eq!(created.comment.as_deref(), Some("c"));

        let loaded = connector.load_schema(&ident).await.unwrap();
        assert_eq!(loaded, created);

        let ns = Namespace::of(["lake", "mem"]).unwrap();
        let listed = connector.list_schemas(&ns).await.unwrap();
        assert_eq!(listed, vec![ident.clone()]);

        assert!(connector.drop_schema(&ident, false).await.unwrap());
        assert!(!connector.drop_schema(&ident, false).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let connector = MemoryConnector::new();
        let ident = NameIdent::schema("lake", "mem", "s1");
        connector
            .create_schema(&ident, None, &BTreeMap::new())
            .await
            .unwrap();
        let err = connector
            .create_schema(&ident, None, &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn non_empty_schema_blocks_plain_drop() {
        let connector = MemoryConnector::new();
        let ident = NameIdent::schema("lake", "mem", "s1");
        connector
            .create_schema(&ident, None, &BTreeMap::new())
            .await
            .unwrap();
        connector.mark_non_empty(&ident).unwrap();

        let err = connector.drop_schema(&ident, false).await.unwrap_err();
        assert!(matches!(err, Error::NonEmptySchema { .. }));
        assert!(connector.drop_schema(&ident, true).await.unwrap());
    }

    #[tokio::test]
    async fn system_properties_dropped_when_configured() {
        let connector = MemoryConnector::new().drop_system_properties();
        let ident = NameIdent::schema("lake", "mem", "s1");

        let mut properties = props(&[("k", "v")]);
        properties.insert(IDENTITY_TAG_KEY.to_string(), "v1-AAAAAAAAACo".to_string());

        let created = connector
            .create_schema(&ident, None, &properties)
            .await
            .unwrap();
        assert!(!created.properties.contains_key(IDENTITY_TAG_KEY));
        assert_eq!(created.properties.get("k").map(String::as_str), Some("v"));
    }

    #[tokio::test]
    async fn external_rename_preserves_properties() {
        let connector = MemoryConnector::new();
        let ident = NameIdent::schema("lake", "pg", "s1");
        connector
            .create_schema(&ident, None, &props(&[("k", "v")]))
            .await
            .unwrap();

        connector.rename_externally(&ident, "s1_new").unwrap();

        assert!(connector.load_schema(&ident).await.is_err());
        let renamed = connector
            .load_schema(&NameIdent::schema("lake", "pg", "s1_new"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "s1_new");
        assert_eq!(renamed.properties.get("k").map(String::as_str), Some("v"));
    }

    #[tokio::test]
    async fn alter_applies_changes_in_order() {
        let connector = MemoryConnector::new();
        let ident = NameIdent::schema("lake", "mem", "s1");
        connector
            .create_schema(&ident, Some("old"), &props(&[("a", "1")]))
            .await
            .unwrap();

        let altered = connector
            .alter_schema(
                &ident,
                &[
                    SchemaChange::SetProperty {
                        name: "b".into(),
                        value: "2".into(),
                    },
                    SchemaChange::RemoveProperty { name: "a".into() },
                    SchemaChange::UpdateComment {
                        comment: "new".into(),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(altered.comment.as_deref(), Some("new"));
        assert!(!altered.properties.contains_key("a"));
        assert_eq!(altered.properties.get("b").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn backend_audit_recorded_when_configured() {
        let connector = MemoryConnector::new().with_backend_audit("pg");
        let ident = NameIdent::schema("lake", "pg", "s1");

        let created = connector
            .create_schema(&ident, None, &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(created.audit.unwrap().creator, "pg");
    }
}
