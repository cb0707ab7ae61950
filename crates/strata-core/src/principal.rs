//! Caller identity for audit attribution.
//!
//! The dispatcher records the acting principal on every entity it creates or
//! modifies. The principal is supplied by the surrounding request context;
//! this module defines the seam, not the authentication.

use std::fmt;
use std::sync::Arc;

/// The identity of the caller performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    /// Name used when no authenticated caller is available.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Creates a principal with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of the current caller identity.
///
/// Request façades install a provider bound to their auth context; tests and
/// embedded callers use [`StaticPrincipalProvider`].
pub trait PrincipalProvider: Send + Sync {
    /// Returns the principal performing the current operation.
    fn current_principal(&self) -> Principal;
}

/// Provider that always returns a fixed principal.
#[derive(Debug, Clone)]
pub struct StaticPrincipalProvider {
    principal: Principal,
}

impl StaticPrincipalProvider {
    /// Creates a provider returning the given principal.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            principal: Principal::new(name),
        }
    }

    /// Creates a provider returning the anonymous principal.
    #[must_use]
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::new(Principal::ANONYMOUS))
    }
}

impl PrincipalProvider for StaticPrincipalProvider {
    fn current_principal(&self) -> Principal {
        self.principal.clone()
    }
}
