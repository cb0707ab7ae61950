//! # strata-store
//!
//! Entity store adapter for the Strata federated metadata catalog.
//!
//! The entity store records stable identities and audit provenance for
//! objects whose structural metadata lives in external backends. It is the
//! source of truth for **identity and audit** only; the backend stays
//! authoritative for structure and properties, and the store is a
//! rebuildable mirror that the import path can always reconstruct.
//!
//! This crate provides:
//!
//! - **Schema Entity**: The identity/audit record for a schema
//! - **Entity Store Trait**: Typed, single-key-atomic CRUD by full name and
//!   by id
//! - **Memory Store**: An in-process implementation for tests and embedded
//!   use

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod store;

pub use entity::{SchemaEntity, SchemaEntityBuilder};
pub use store::{EntityStore, EntityTransform, MemoryEntityStore};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::entity::SchemaEntity;
    pub use crate::store::{EntityStore, MemoryEntityStore};
}
