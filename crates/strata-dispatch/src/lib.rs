//! # strata-dispatch
//!
//! Schema operation dispatcher for the Strata federated metadata catalog.
//!
//! The dispatcher is the coordination core of the service. For each schema
//! operation it:
//!
//! - routes the operation to the owning backend through the catalog
//!   registry,
//! - serializes concurrent operations through the hierarchical name-path
//!   lock,
//! - reconciles the backend's authoritative view with the entity store that
//!   records stable identities and audit provenance, and
//! - recovers consistently when backend and store disagree (external
//!   renames, missed writes, multi-catalog conflicts).
//!
//! ## Dual-write semantics
//!
//! There is no distributed transaction. Backend success is authoritative;
//! the store is a rebuildable cache of identity and audit. Store failures
//! after a successful backend operation degrade the combined view instead of
//! failing the call, and the import path re-establishes store rows on the
//! next load.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_connector::MemoryConnector;
//! use strata_core::NameIdent;
//! use strata_dispatch::{CatalogRegistry, SchemaDispatcher};
//! use strata_store::MemoryEntityStore;
//!
//! let registry = Arc::new(CatalogRegistry::new());
//! registry.register(NameIdent::catalog("lake", "pg"), Arc::new(MemoryConnector::new()))?;
//!
//! let dispatcher = SchemaDispatcher::builder()
//!     .registry(registry)
//!     .store(Arc::new(MemoryEntityStore::new()))
//!     .build()?;
//!
//! let combined = dispatcher
//!     .create_schema(&NameIdent::schema("lake", "pg", "sales"), None, &Default::default())
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod combined;
pub mod dispatcher;
pub mod registry;

pub use combined::CombinedSchema;
pub use dispatcher::{SchemaDispatcher, SchemaDispatcherBuilder};
pub use registry::{CatalogHandle, CatalogRegistry};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::combined::CombinedSchema;
    pub use crate::dispatcher::SchemaDispatcher;
    pub use crate::registry::{CatalogHandle, CatalogRegistry};
}
