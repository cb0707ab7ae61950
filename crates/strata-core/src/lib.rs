//! # strata-core
//!
//! Core abstractions for the Strata federated metadata catalog.
//!
//! This crate provides the foundational types and traits used across all
//! Strata components:
//!
//! - **Name Identifiers**: Dotted path tuples addressing metalakes, catalogs,
//!   and schemas
//! - **Hierarchical Lock**: Tree-structured reader/writer lock keyed by name
//!   paths
//! - **Identity Tag**: Reserved-property encoding of internal ids so external
//!   renames preserve identity
//! - **Audit Info**: Creator/modifier provenance attached to entities
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `strata-core` is the **only** crate allowed to define shared primitives.
//! Store adapters, connectors, and the dispatcher all build on the contracts
//! defined here.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let ident = NameIdent::schema("lake", "pg", "sales");
//! assert_eq!(ident.to_string(), "lake.pg.sales");
//! assert_eq!(ident.catalog_ident().unwrap().to_string(), "lake.pg");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod error;
pub mod id;
pub mod ident;
pub mod lock;
pub mod observability;
pub mod principal;
pub mod tag;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audit::AuditInfo;
    pub use crate::error::{Error, Result};
    pub use crate::id::{IdGenerator, MonotonicIdGenerator};
    pub use crate::ident::{NameIdent, Namespace};
    pub use crate::lock::{LockMode, TreeLock, TreeLockGuard};
    pub use crate::principal::{Principal, PrincipalProvider, StaticPrincipalProvider};
    pub use crate::tag::IDENTITY_TAG_KEY;
}

pub use audit::AuditInfo;
pub use error::{Error, Result};
pub use id::{IdGenerator, MonotonicIdGenerator};
pub use ident::{NameIdent, Namespace};
pub use lock::{LockMode, TreeLock, TreeLockGuard};
pub use principal::{Principal, PrincipalProvider, StaticPrincipalProvider};
