//! Catalog registry: resolves an identifier to the owning backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use strata_core::error::{Error, Result};
use strata_core::ident::NameIdent;
use strata_connector::capability::Scope;
use strata_connector::ops::{Connector, SchemaOps};
use strata_connector::schema::SchemaChange;

/// Registry of the catalogs this process serves.
///
/// The registry is the routing seam: given a schema identifier, the
/// dispatcher asks for the handle of the catalog named by the first two path
/// levels. Registration happens at startup or when catalogs are attached;
/// resolution happens on every operation.
#[derive(Default)]
pub struct CatalogRegistry {
    catalogs: RwLock<HashMap<String, Arc<dyn Connector>>>,
}

impl std::fmt::Debug for CatalogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.catalogs.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("CatalogRegistry")
            .field("catalogs", &count)
            .finish()
    }
}

impl CatalogRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector under the given catalog identifier.
    ///
    /// Replaces any previous registration for the same identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the registry lock is poisoned.
    pub fn register(&self, ident: NameIdent, connector: Arc<dyn Connector>) -> Result<()> {
        let mut catalogs = self.catalogs.write().map_err(|_| Error::Internal {
            message: "registry lock poisoned".into(),
        })?;
        catalogs.insert(ident.to_string(), connector);
        Ok(())
    }

    /// Resolves the catalog owning the given identifier.
    ///
    /// The identifier may be the catalog's own or any identifier beneath it;
    /// the first two path levels select the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchCatalog`] if no catalog is registered under
    /// the identifier.
    pub fn resolve(&self, ident: &NameIdent) -> Result<CatalogHandle> {
        let catalog_ident = if ident.is_schema() {
            ident.catalog_ident()?
        } else {
            ident.clone()
        };
        let catalogs = self.catalogs.read().map_err(|_| Error::Internal {
            message: "registry lock poisoned".into(),
        })?;
        let connector = catalogs
            .get(&catalog_ident.to_string())
            .cloned()
            .ok_or_else(|| Error::no_such_catalog(&catalog_ident))?;
        Ok(CatalogHandle {
            ident: catalog_ident,
            connector,
        })
    }
}

/// Handle to one resolved catalog and its capability surfaces.
#[derive(Clone)]
pub struct CatalogHandle {
    ident: NameIdent,
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for CatalogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogHandle")
            .field("ident", &self.ident)
            .finish_non_exhaustive()
    }
}

impl CatalogHandle {
    /// Returns the catalog's identifier.
    #[must_use]
    pub const fn ident(&self) -> &NameIdent {
        &self.ident
    }

    /// Returns the backend's schema operation surface.
    #[must_use]
    pub fn schema_ops(&self) -> &dyn SchemaOps {
        self.connector.schema_ops()
    }

    /// Returns true if the backend is the store of record for schemas.
    #[must_use]
    pub fn is_schema_managed(&self) -> bool {
        self.connector.capability().is_managed(Scope::Schema)
    }

    /// Validates caller-supplied properties for schema creation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] on unknown, reserved, or missing
    /// required keys.
    pub fn validate_create_properties(&self, properties: &BTreeMap<String, String>) -> Result<()> {
        self.connector
            .schema_properties_metadata()
            .validate_create(properties)
    }

    /// Validates the property-touching changes of a schema alteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] on reserved, immutable, or unknown
    /// keys.
    pub fn validate_alter_changes(&self, changes: &[SchemaChange]) -> Result<()> {
        self.connector
            .schema_properties_metadata()
            .validate_alter(changes)
    }

    /// Returns the keys of `properties` the backend declares confidential.
    #[must_use]
    pub fn hidden_property_names(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> BTreeSet<String> {
        self.connector
            .schema_properties_metadata()
            .hidden_keys(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_connector::memory::MemoryConnector;

    #[test]
    fn resolve_by_schema_ident_selects_catalog() {
        let registry = CatalogRegistry::new();
        registry
            .register(
                NameIdent::catalog("lake", "pg"),
                Arc::new(MemoryConnector::new()),
            )
            .unwrap();

        let handle = registry
            .resolve(&NameIdent::schema("lake", "pg", "sales"))
            .unwrap();
        assert_eq!(handle.ident().to_string(), "lake.pg");
        assert!(!handle.is_schema_managed());
    }

    #[test]
    fn resolve_unknown_catalog_fails_typed() {
        let registry = CatalogRegistry::new();
        let err = registry
            .resolve(&NameIdent::schema("lake", "nope", "sales"))
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchCatalog { .. }));
    }

    #[test]
    fn registration_replaces_previous_connector() {
        let registry = CatalogRegistry::new();
        let ident = NameIdent::catalog("lake", "mem");

        registry
            .register(ident.clone(), Arc::new(MemoryConnector::new()))
            .unwrap();
        registry
            .register(ident.clone(), Arc::new(MemoryConnector::new().managed()))
            .unwrap();

        let handle = registry.resolve(&ident).unwrap();
        assert!(handle.is_schema_managed());
    }
}
