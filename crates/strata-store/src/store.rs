//! Entity store contract and in-memory implementation.
//!
//! The store offers typed CRUD on schema entities, keyed by full name with a
//! secondary index by id. All operations are atomic with respect to
//! concurrent store operations on the same key. The store never initiates
//! backend work; the dispatcher drives it strictly after backend success.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use strata_core::error::{Error, Result};
use strata_core::ident::NameIdent;

use crate::entity::SchemaEntity;

/// Transform applied to an entity inside [`EntityStore::update`].
///
/// Boxed so the store trait stays object safe behind `Arc<dyn EntityStore>`.
pub type EntityTransform = Box<dyn FnOnce(SchemaEntity) -> SchemaEntity + Send>;

/// Typed CRUD over schema entities.
///
/// Single-key atomicity is the implementation's responsibility; callers
/// serialize multi-step flows through the hierarchical lock.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Upserts an entity by full name.
    ///
    /// Re-keying an existing id within its original catalog namespace
    /// replaces the old row (the external-rename import path). Re-keying an
    /// id across catalog namespaces fails with
    /// [`Error::EntityAlreadyExists`]: two catalogs are claiming the same
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityAlreadyExists`] on an identity conflict, or
    /// when the name is taken by a different id and `overwrite` is false.
    async fn put(&self, entity: &SchemaEntity, overwrite: bool) -> Result<()>;

    /// Reads an entity by full name.
    ///
    /// # Errors
    ///
    /// Returns store-level failures only; absence is `Ok(None)`.
    async fn get(&self, ident: &NameIdent) -> Result<Option<SchemaEntity>>;

    /// Reads an entity by id.
    ///
    /// # Errors
    ///
    /// Returns store-level failures only; absence is `Ok(None)`.
    async fn get_by_id(&self, id: u64) -> Result<Option<SchemaEntity>>;

    /// Reads the entity with the given id, applies `transform`, writes the
    /// result back, and returns it.
    ///
    /// The transform must preserve the id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchEntity`] if the id is absent, or
    /// [`Error::Internal`] if the transform changed the id.
    async fn update(&self, id: u64, transform: EntityTransform) -> Result<SchemaEntity>;

    /// Deletes an entity by full name.
    ///
    /// `cascade` is part of the store contract for containers; a schema row
    /// carries no children at this layer, so it only widens the delete to
    /// whatever the store holds beneath the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchEntity`] if the key is absent.
    async fn delete(&self, ident: &NameIdent, cascade: bool) -> Result<()>;
}

/// In-memory entity store for tests and embedded use.
///
/// Thread-safe via `RwLock`. Entities are held as serialized bytes so the
/// store behaves like the key-value systems it stands in for.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_name: HashMap<String, Bytes>,
    by_id: HashMap<u64, String>,
}

impl MemoryEntityStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.by_name.len()).unwrap_or(0)
    }

    /// Returns true if the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_inner(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| Error::Internal {
            message: "store lock poisoned".into(),
        })
    }

    fn write_inner(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| Error::Internal {
            message: "store lock poisoned".into(),
        })
    }
}

fn serialize(entity: &SchemaEntity) -> Result<Bytes> {
    serde_json::to_vec(entity)
        .map(Bytes::from)
        .map_err(|e| Error::store_with_source("serialize entity", e))
}

fn deserialize(bytes: &Bytes) -> Result<SchemaEntity> {
    serde_json::from_slice(bytes).map_err(|e| Error::store_with_source("deserialize entity", e))
}

impl Inner {
    fn get_by_name(&self, key: &str) -> Result<Option<SchemaEntity>> {
        self.by_name.get(key).map(deserialize).transpose()
    }

    fn insert(&mut self, key: String, entity: &SchemaEntity) -> Result<()> {
        self.by_name.insert(key.clone(), serialize(entity)?);
        self.by_id.insert(entity.id, key);
        Ok(())
    }

    fn remove_by_name(&mut self, key: &str) -> Result<Option<SchemaEntity>> {
        let Some(bytes) = self.by_name.remove(key) else {
            return Ok(None);
        };
        let entity = deserialize(&bytes)?;
        // Only clear the id index if it still points at this key.
        if self.by_id.get(&entity.id).is_some_and(|k| k == key) {
            self.by_id.remove(&entity.id);
        }
        Ok(Some(entity))
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn put(&self, entity: &SchemaEntity, overwrite: bool) -> Result<()> {
        let key = entity.ident()?.to_string();
        let mut inner = self.write_inner()?;

        if let Some(existing_key) = inner.by_id.get(&entity.id).cloned() {
            let existing = inner
                .get_by_name(&existing_key)?
                .ok_or_else(|| Error::store(format!("dangling id index for {existing_key}")))?;
            if existing.namespace != entity.namespace {
                // The id is owned by a row under a different catalog.
                return Err(Error::EntityAlreadyExists {
                    ident: existing_key,
                });
            }
            if existing_key != key {
                // Same catalog, new leaf name: re-key the row.
                let _ = inner.remove_by_name(&existing_key)?;
            }
        } else if let Some(current) = inner.get_by_name(&key)? {
            if !overwrite {
                return Err(Error::EntityAlreadyExists { ident: key });
            }
            // Name reused by a fresh identity: retire the old row entirely.
            if current.id != entity.id {
                let _ = inner.remove_by_name(&key)?;
            }
        }

        inner.insert(key, entity)
    }

    async fn get(&self, ident: &NameIdent) -> Result<Option<SchemaEntity>> {
        self.read_inner()?.get_by_name(&ident.to_string())
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<SchemaEntity>> {
        let inner = self.read_inner()?;
        match inner.by_id.get(&id) {
            Some(key) => inner.get_by_name(key),
            None => Ok(None),
        }
    }

    async fn update(&self, id: u64, transform: EntityTransform) -> Result<SchemaEntity> {
        let mut inner = self.write_inner()?;
        let key = inner.by_id.get(&id).cloned().ok_or_else(|| Error::NoSuchEntity {
            ident: format!("id={id}"),
        })?;
        let current = inner
            .get_by_name(&key)?
            .ok_or_else(|| Error::store(format!("dangling id index for {key}")))?;

        let updated = transform(current);
        if updated.id != id {
            return Err(Error::Internal {
                message: format!("entity transform changed id {id} to {}", updated.id),
            });
        }

        let new_key = updated.ident()?.to_string();
        if new_key != key {
            let _ = inner.remove_by_name(&key)?;
        }
        inner.insert(new_key, &updated)?;
        Ok(updated)
    }

    async fn delete(&self, ident: &NameIdent, _cascade: bool) -> Result<()> {
        let key = ident.to_string();
        let mut inner = self.write_inner()?;
        match inner.remove_by_name(&key)? {
            Some(_) => Ok(()),
            None => Err(Error::NoSuchEntity { ident: key }),
        }
    }
}
