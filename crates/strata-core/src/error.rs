//! Error types and result aliases for Strata.
//!
//! This module defines the shared error types used across all Strata
//! components. Errors are structured for programmatic handling: routing
//! errors, existence errors, precondition errors, reconciliation errors,
//! and infrastructure errors each have their own variant.

use std::fmt;

/// The result type used throughout Strata.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Strata operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The addressed catalog does not exist in the registry.
    #[error("no such catalog: {ident}")]
    NoSuchCatalog {
        /// Full name of the missing catalog.
        ident: String,
    },

    /// The addressed schema does not exist in the backend.
    #[error("no such schema: {ident}")]
    NoSuchSchema {
        /// Full name of the missing schema.
        ident: String,
    },

    /// A schema with the same name already exists in the backend.
    #[error("schema already exists: {ident}")]
    SchemaAlreadyExists {
        /// Full name of the conflicting schema.
        ident: String,
    },

    /// The schema still holds objects and cascade was not requested.
    #[error("schema is not empty: {ident}")]
    NonEmptySchema {
        /// Full name of the non-empty schema.
        ident: String,
    },

    /// Invalid input was provided by the caller.
    #[error("illegal argument: {message}")]
    IllegalArgument {
        /// Description of what made the input invalid.
        message: String,
    },

    /// The addressed entity is absent from the entity store.
    #[error("no such entity: {ident}")]
    NoSuchEntity {
        /// Key of the missing entity.
        ident: String,
    },

    /// An entity with a conflicting identity already exists in the store.
    #[error("entity already exists: {ident}")]
    EntityAlreadyExists {
        /// Key of the conflicting entity.
        ident: String,
    },

    /// The same schema identity is claimed by more than one catalog.
    ///
    /// Surfaced when an import discovers that another catalog already owns
    /// the store row for this id. The operator must reduce to a single
    /// owning catalog.
    #[error(
        "schema {ident} is managed by multiple catalogs; remove all catalogs \
         managing this schema, then recreate one catalog to ensure \
         single-catalog management"
    )]
    ManagedByMultipleCatalogs {
        /// Full name of the schema observed under a second catalog.
        ident: String,
    },

    /// An entity store operation failed.
    #[error("store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a routing error for a missing catalog.
    #[must_use]
    pub fn no_such_catalog(ident: impl fmt::Display) -> Self {
        Self::NoSuchCatalog {
            ident: ident.to_string(),
        }
    }

    /// Creates an existence error for a missing schema.
    #[must_use]
    pub fn no_such_schema(ident: impl fmt::Display) -> Self {
        Self::NoSuchSchema {
            ident: ident.to_string(),
        }
    }

    /// Creates an illegal-argument error with the given message.
    #[must_use]
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    /// Creates a new store error with the given message.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new store error with a source cause.
    #[must_use]
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error indicates a missing store entity.
    #[must_use]
    pub const fn is_no_such_entity(&self) -> bool {
        matches!(self, Self::NoSuchEntity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_identifier() {
        let err = Error::no_such_catalog("lake.pg");
        assert_eq!(err.to_string(), "no such catalog: lake.pg");

        let err = Error::no_such_schema("lake.pg.sales");
        assert_eq!(err.to_string(), "no such schema: lake.pg.sales");
    }

    #[test]
    fn store_error_carries_source() {
        let io = std::io::Error::other("disk gone");
        let err = Error::store_with_source("put failed", io);
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("disk gone"));
    }

    #[test]
    fn multi_catalog_message_names_the_remedy() {
        let err = Error::ManagedByMultipleCatalogs {
            ident: "lake.pg.sales".into(),
        };
        assert!(err.to_string().contains("single-catalog management"));
    }
}
