//! The polymorphic backend surface the dispatcher routes through.

use std::collections::BTreeMap;

use async_trait::async_trait;

use strata_core::error::Result;
use strata_core::ident::{NameIdent, Namespace};

use crate::capability::Capability;
use crate::properties::PropertiesMetadata;
use crate::schema::{Schema, SchemaChange};

/// Schema operations offered by a backend.
///
/// Every backend implements this surface behind a single polymorphic call
/// site; the dispatcher never special-cases a backend type. Calls may block
/// indefinitely — they are the suspension points of a request.
#[async_trait]
pub trait SchemaOps: Send + Sync {
    /// Lists the schemas in the given catalog namespace.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::Error::NoSuchCatalog`] if the backend no
    /// longer knows the namespace; other backend failures propagate.
    async fn list_schemas(&self, namespace: &Namespace) -> Result<Vec<NameIdent>>;

    /// Creates a schema and returns the backend's view of it.
    ///
    /// Some backends are asynchronous: the returned view is what the
    /// backend accepted, not necessarily what a subsequent load would see.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::Error::SchemaAlreadyExists`] on a name
    /// collision; other backend failures propagate.
    async fn create_schema(
        &self,
        ident: &NameIdent,
        comment: Option<&str>,
        properties: &BTreeMap<String, String>,
    ) -> Result<Schema>;

    /// Loads the backend's current view of a schema.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::Error::NoSuchSchema`] if the schema does not
    /// exist.
    async fn load_schema(&self, ident: &NameIdent) -> Result<Schema>;

    /// Applies the given changes and returns the altered view.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::Error::NoSuchSchema`] if the schema does not
    /// exist.
    async fn alter_schema(&self, ident: &NameIdent, changes: &[SchemaChange]) -> Result<Schema>;

    /// Drops a schema, returning whether the backend removed anything.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::Error::NonEmptySchema`] if the schema holds
    /// objects and `cascade` is false.
    async fn drop_schema(&self, ident: &NameIdent, cascade: bool) -> Result<bool>;
}

/// One registered backend: its operation surface plus its declarations.
///
/// Capability and property metadata are data, not behavior; the dispatcher
/// reads them to decide routing and validation before touching
/// [`SchemaOps`].
pub trait Connector: Send + Sync {
    /// Returns the schema operation surface.
    fn schema_ops(&self) -> &dyn SchemaOps;

    /// Returns the declared schema property metadata.
    fn schema_properties_metadata(&self) -> &PropertiesMetadata;

    /// Returns the declared capability flags.
    fn capability(&self) -> &Capability;
}
