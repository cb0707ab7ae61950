//! The schema operation dispatcher.
//!
//! One dispatcher serves every catalog in the registry. Each operation
//! resolves the owning backend, takes the hierarchical lock for its path,
//! delegates to the backend, and then reconciles the entity store according
//! to the catalog's capability: managed backends are their own store of
//! record and never get a mirror row; all others are mirrored with
//! best-effort dual-write semantics where backend success is authoritative.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::Instrument;

use strata_core::audit::AuditInfo;
use strata_core::error::{Error, Result};
use strata_core::id::{IdGenerator, MonotonicIdGenerator};
use strata_core::ident::{require_schema_namespace, NameIdent, Namespace};
use strata_core::lock::{LockMode, TreeLock};
use strata_core::observability::dispatch_span;
use strata_core::principal::{PrincipalProvider, StaticPrincipalProvider};
use strata_core::tag;
use strata_connector::schema::SchemaChange;
use strata_store::entity::SchemaEntity;
use strata_store::store::EntityStore;

use crate::combined::CombinedSchema;
use crate::registry::CatalogRegistry;

/// Dispatches schema operations across all registered catalogs.
///
/// Cheap to clone is not a goal; share one instance behind an `Arc` the way
/// request façades hold their state.
pub struct SchemaDispatcher {
    registry: Arc<CatalogRegistry>,
    store: Arc<dyn EntityStore>,
    id_gen: Arc<dyn IdGenerator>,
    lock: TreeLock,
    principal_provider: Arc<dyn PrincipalProvider>,
}

impl std::fmt::Debug for SchemaDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl SchemaDispatcher {
    /// Creates a new builder for constructing a dispatcher.
    #[must_use]
    pub fn builder() -> SchemaDispatcherBuilder {
        SchemaDispatcherBuilder::default()
    }

    /// Lists the schemas in the given catalog namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the namespace does not address
    /// a catalog, [`Error::NoSuchCatalog`] if no such catalog is registered;
    /// backend failures propagate as received.
    pub async fn list_schemas(&self, namespace: &Namespace) -> Result<Vec<NameIdent>> {
        require_schema_namespace(namespace)?;
        let span = dispatch_span("list_schemas", &namespace.to_string());
        async {
            let catalog_ident = namespace.to_ident()?;
            let _lock = self.lock.acquire(namespace.levels(), LockMode::Read).await;
            let catalog = self.registry.resolve(&catalog_ident)?;
            catalog.schema_ops().list_schemas(namespace).await
        }
        .instrument(span)
        .await
    }

    /// Creates a schema in the owning backend and mirrors it in the store.
    ///
    /// The freshly allocated internal id is injected into the properties as
    /// the identity tag before the backend call, so the id is only ever
    /// visible once the backend has accepted the schema. For managed
    /// catalogs no store row is written. A store failure after backend
    /// success is logged and degrades the returned view instead of failing
    /// the call; the import path reconciles on the next load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchCatalog`], [`Error::IllegalArgument`] on
    /// property validation, [`Error::SchemaAlreadyExists`], or whatever the
    /// backend raised.
    pub async fn create_schema(
        &self,
        ident: &NameIdent,
        comment: Option<&str>,
        properties: &BTreeMap<String, String>,
    ) -> Result<CombinedSchema> {
        require_schema_ident(ident)?;
        let span = dispatch_span("create_schema", &ident.to_string());
        async {
            let catalog_ident = ident.catalog_ident()?;
            let catalog = self.registry.resolve(ident)?;
            catalog.validate_create_properties(properties)?;

            let uid = self.id_gen.next_id();
            let tagged = tag::inject_into(properties, uid);

            let _lock = self
                .lock
                .acquire(&catalog_ident.levels(), LockMode::Write)
                .await;

            // The backend view is not re-fetched after creation: some
            // backends are asynchronous and the schema may not be readable
            // yet.
            let schema = catalog
                .schema_ops()
                .create_schema(ident, comment, &tagged)
                .await?;

            let hidden = catalog.hidden_property_names(&schema.properties);
            let combined = CombinedSchema::of(schema).with_hidden_keys(hidden);
            if catalog.is_schema_managed() {
                return Ok(combined);
            }

            let principal = self.principal_provider.current_principal();
            let entity = SchemaEntity::builder()
                .id(uid)
                .name(ident.name())
                .namespace(ident.namespace().clone())
                .audit(AuditInfo::created_by(principal.name()))
                .build()?;

            match self.store.put(&entity, true).await {
                Ok(()) => Ok(combined.with_entity(Some(entity))),
                Err(cause) => {
                    // The backend created the schema; the call must still
                    // succeed. The next load imports the missing row.
                    tracing::error!(
                        op = "create_schema",
                        ident = %ident,
                        phase = "store_put",
                        cause = %cause,
                        "store write failed after backend create"
                    );
                    Ok(combined)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Loads a schema, importing its store row on first sight.
    ///
    /// The load itself runs under a READ lock on the schema path. When the
    /// store does not yet reflect the schema, the read lock is released and
    /// a WRITE lock on the catalog path is taken for the import. The two
    /// phases are not atomic; a concurrent drop between them is tolerated
    /// because drop already accepts missing store rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchCatalog`], [`Error::NoSuchSchema`],
    /// [`Error::ManagedByMultipleCatalogs`] when two catalogs claim the same
    /// identity, or [`Error::Store`] on import failures.
    pub async fn load_schema(&self, ident: &NameIdent) -> Result<CombinedSchema> {
        require_schema_ident(ident)?;
        let span = dispatch_span("load_schema", &ident.to_string());
        async {
            let combined = {
                let _lock = self.lock.acquire(&ident.levels(), LockMode::Read).await;
                self.internal_load(ident).await?
            };

            if !combined.imported() {
                let catalog_ident = ident.catalog_ident()?;
                let _lock = self
                    .lock
                    .acquire(&catalog_ident.levels(), LockMode::Write)
                    .await;
                self.import(ident).await?;
            }

            // The caller sees the view computed under the read lock; import
            // only fixes up the store.
            Ok(combined)
        }
        .instrument(span)
        .await
    }

    /// Applies changes to a schema and refreshes the store-held audit.
    ///
    /// Rename is not supported at this layer and is rejected before any
    /// backend or store call. The parent path is not re-locked even though
    /// a backend property change could in principle have catalog-level side
    /// effects; only the schema path is held exclusively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] on a rename change or invalid
    /// property changes, [`Error::NoSuchCatalog`], [`Error::NoSuchSchema`],
    /// or whatever the backend raised.
    pub async fn alter_schema(
        &self,
        ident: &NameIdent,
        changes: &[SchemaChange],
    ) -> Result<CombinedSchema> {
        require_schema_ident(ident)?;
        if changes.iter().any(SchemaChange::is_rename) {
            return Err(Error::illegal_argument("schema rename is not supported"));
        }
        let span = dispatch_span("alter_schema", &ident.to_string());
        async {
            let _lock = self.lock.acquire(&ident.levels(), LockMode::Write).await;

            let catalog = self.registry.resolve(ident)?;
            catalog.validate_alter_changes(changes)?;

            let schema = catalog.schema_ops().alter_schema(ident, changes).await?;
            let hidden = catalog.hidden_property_names(&schema.properties);
            let combined = CombinedSchema::of(schema).with_hidden_keys(hidden);
            if catalog.is_schema_managed() {
                return Ok(combined);
            }

            // Prefer the tag the backend round-tripped; fall back to the
            // name-keyed row for backends that drop unknown properties.
            let id = match combined.identity_tag() {
                Some(id) => id,
                None => match self.store.get(ident).await? {
                    Some(entity) => entity.id,
                    // Never created by us and never imported: nothing to
                    // update.
                    None => return Ok(combined),
                },
            };

            let modifier = self.principal_provider.current_principal();
            let namespace = ident.namespace().clone();
            let transform = Box::new(move |entity: SchemaEntity| {
                let audit = entity.audit.modified_by(modifier.name());
                SchemaEntity {
                    id: entity.id,
                    name: entity.name,
                    namespace,
                    audit,
                }
            });

            match self.store.update(id, transform).await {
                Ok(updated) => Ok(combined.with_entity(Some(updated))),
                Err(cause) => {
                    tracing::error!(
                        op = "alter_schema",
                        ident = %ident,
                        phase = "store_update",
                        cause = %cause,
                        "store update failed after backend alter"
                    );
                    Ok(combined)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Drops a schema from the backend and best-effort from the store.
    ///
    /// The backend's boolean outcome is returned regardless of the store
    /// outcome. The schema may exist in neither, either, or both places;
    /// a missing store row is logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchCatalog`], [`Error::NonEmptySchema`] when the
    /// schema holds objects and `cascade` is false, or a store error other
    /// than absence.
    pub async fn drop_schema(&self, ident: &NameIdent, cascade: bool) -> Result<bool> {
        require_schema_ident(ident)?;
        let span = dispatch_span("drop_schema", &ident.to_string());
        async {
            let catalog_ident = ident.catalog_ident()?;
            let _lock = self
                .lock
                .acquire(&catalog_ident.levels(), LockMode::Write)
                .await;

            let catalog = self.registry.resolve(ident)?;
            let dropped = catalog.schema_ops().drop_schema(ident, cascade).await?;
            if catalog.is_schema_managed() {
                return Ok(dropped);
            }

            match self.store.delete(ident, true).await {
                Ok(()) => {}
                Err(cause) if cause.is_no_such_entity() => {
                    tracing::warn!(
                        op = "drop_schema",
                        ident = %ident,
                        phase = "store_delete",
                        cause = %cause,
                        "schema to drop was absent from the store"
                    );
                }
                Err(cause) => return Err(cause),
            }
            Ok(dropped)
        }
        .instrument(span)
        .await
    }

    /// Loads the backend view and pairs it with the store row, reporting
    /// whether the store already reflects the schema.
    async fn internal_load(&self, ident: &NameIdent) -> Result<CombinedSchema> {
        let catalog = self.registry.resolve(ident)?;
        let schema = catalog.schema_ops().load_schema(ident).await?;
        let hidden = catalog.hidden_property_names(&schema.properties);
        let combined = CombinedSchema::of(schema).with_hidden_keys(hidden);

        if catalog.is_schema_managed() {
            // The backend is the store of record; nothing to import.
            return Ok(combined.with_imported(true));
        }

        match combined.identity_tag() {
            // No tag round-tripped: either the backend drops unknown
            // properties or the schema predates us. The name-keyed row
            // decides whether an import is still pending.
            None => {
                let entity = self.store.get(ident).await?;
                let imported = entity.is_some();
                Ok(combined.with_entity(entity).with_imported(imported))
            }
            Some(id) => {
                // An id hit whose row is keyed under a different name means
                // the backend was renamed externally; the row still serves
                // the view (identity and audit are valid) but the store
                // needs re-keying, so the schema counts as not imported.
                let entity = self.store.get_by_id(id).await?;
                let imported = entity
                    .as_ref()
                    .is_some_and(|e| e.name == ident.name() && e.namespace == *ident.namespace());
                Ok(combined.with_entity(entity).with_imported(imported))
            }
        }
    }

    /// Re-establishes the store row for a schema the backend already holds.
    ///
    /// Runs under a WRITE lock on the catalog path.
    async fn import(&self, ident: &NameIdent) -> Result<()> {
        let combined = self.internal_load(ident).await?;
        if combined.imported() {
            return Ok(());
        }

        let uid = match combined.identity_tag() {
            Some(id) => {
                // A tag without a matching row means the schema was renamed
                // by an external system; overwrite the stored entity under
                // the new name to restore consistency.
                tracing::warn!(
                    op = "import_schema",
                    ident = %ident,
                    phase = "store_put",
                    id,
                    "identity tag present but store row missing; re-keying after external rename"
                );
                id
            }
            None => self.id_gen.next_id(),
        };

        let principal = self.principal_provider.current_principal();
        let mut audit = AuditInfo::builder();
        if let Some(backend_audit) = &combined.schema().audit {
            audit = audit
                .creator(&backend_audit.creator)
                .create_time(backend_audit.create_time);
            if let Some(modifier) = &backend_audit.last_modifier {
                audit = audit.last_modifier(modifier);
            }
            if let Some(time) = backend_audit.last_modified_time {
                audit = audit.last_modified_time(time);
            }
        }

        let entity = SchemaEntity::builder()
            .id(uid)
            .name(ident.name())
            .namespace(ident.namespace().clone())
            .audit(audit.build_or_synthesize(principal.name()))
            .build()?;

        match self.store.put(&entity, true).await {
            Ok(()) => Ok(()),
            Err(Error::EntityAlreadyExists { ident: existing }) => {
                tracing::error!(
                    op = "import_schema",
                    ident = %ident,
                    phase = "store_put",
                    cause = %existing,
                    "identity already owned by another catalog"
                );
                Err(Error::ManagedByMultipleCatalogs {
                    ident: ident.to_string(),
                })
            }
            Err(cause) => {
                tracing::error!(
                    op = "import_schema",
                    ident = %ident,
                    phase = "store_put",
                    cause = %cause,
                    "failed to import schema entity"
                );
                Err(Error::store_with_source("failed to import schema entity", cause))
            }
        }
    }
}

fn require_schema_ident(ident: &NameIdent) -> Result<()> {
    if ident.is_schema() {
        Ok(())
    } else {
        Err(Error::illegal_argument(format!(
            "'{ident}' is not a schema identifier"
        )))
    }
}

/// Builder for [`SchemaDispatcher`].
#[derive(Default)]
pub struct SchemaDispatcherBuilder {
    registry: Option<Arc<CatalogRegistry>>,
    store: Option<Arc<dyn EntityStore>>,
    id_gen: Option<Arc<dyn IdGenerator>>,
    lock: Option<TreeLock>,
    principal_provider: Option<Arc<dyn PrincipalProvider>>,
}

impl std::fmt::Debug for SchemaDispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDispatcherBuilder")
            .finish_non_exhaustive()
    }
}

impl SchemaDispatcherBuilder {
    /// Sets the catalog registry. Required.
    #[must_use]
    pub fn registry(mut self, registry: Arc<CatalogRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the entity store. Required.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the id generator. Defaults to a fresh monotonic generator; pass
    /// the shared one when multiple dispatchers run in one process.
    #[must_use]
    pub fn id_generator(mut self, id_gen: Arc<dyn IdGenerator>) -> Self {
        self.id_gen = Some(id_gen);
        self
    }

    /// Sets the lock tree. Defaults to a fresh tree; pass the shared one
    /// when multiple dispatchers serve overlapping namespaces.
    #[must_use]
    pub fn lock(mut self, lock: TreeLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Sets the principal provider. Defaults to the anonymous principal.
    #[must_use]
    pub fn principal_provider(mut self, provider: Arc<dyn PrincipalProvider>) -> Self {
        self.principal_provider = Some(provider);
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the registry or store is
    /// missing.
    pub fn build(self) -> Result<SchemaDispatcher> {
        let registry = self
            .registry
            .ok_or_else(|| Error::illegal_argument("dispatcher requires a catalog registry"))?;
        let store = self
            .store
            .ok_or_else(|| Error::illegal_argument("dispatcher requires an entity store"))?;
        Ok(SchemaDispatcher {
            registry,
            store,
            id_gen: self
                .id_gen
                .unwrap_or_else(|| Arc::new(MonotonicIdGenerator::new())),
            lock: self.lock.unwrap_or_default(),
            principal_provider: self
                .principal_provider
                .unwrap_or_else(|| StaticPrincipalProvider::anonymous()),
        })
    }
}
