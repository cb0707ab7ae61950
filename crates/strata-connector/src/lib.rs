//! # strata-connector
//!
//! Backend connector surfaces for the Strata federated metadata catalog.
//!
//! A connector adapts one external metadata system (a relational catalog, a
//! table-format catalog, a message-stream catalog, a filesystem) to the
//! capability surfaces the dispatcher routes through:
//!
//! - **Schema Ops**: The polymorphic list/create/load/alter/drop surface
//! - **Property Metadata**: Declared property keys with create/alter
//!   validation and hidden-key reporting
//! - **Capability**: Per-scope flags, most importantly whether the backend
//!   itself is the store of record for schemas
//!
//! Backends differ widely: some are asynchronous, some silently drop unknown
//! properties, some rename objects behind the service's back. The connector
//! contract deliberately promises only what the dispatcher's reconciliation
//! rules can absorb.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod capability;
pub mod memory;
pub mod ops;
pub mod properties;
pub mod schema;

pub use capability::{Capability, Scope};
pub use memory::MemoryConnector;
pub use ops::{Connector, SchemaOps};
pub use properties::{PropertiesMetadata, PropertyEntry};
pub use schema::{Schema, SchemaChange};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capability::{Capability, Scope};
    pub use crate::ops::{Connector, SchemaOps};
    pub use crate::properties::PropertiesMetadata;
    pub use crate::schema::{Schema, SchemaChange};
}
