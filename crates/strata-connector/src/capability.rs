//! Per-catalog capability flags.
//!
//! Capabilities are plain data, not subclasses: the dispatcher asks a
//! catalog what it can do and routes accordingly. The flag that shapes
//! every schema operation is whether the backend is *managed* at the
//! schema scope, i.e. the backend itself is the store of record and the
//! dispatcher must never write a mirror entity for it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Object scope a capability flag applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// Schema-level objects.
    Schema,
}

/// Capability flags declared by a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    managed_scopes: BTreeSet<Scope>,
}

impl Capability {
    /// Capability with no managed scopes: the store mirrors everything.
    #[must_use]
    pub fn mirrored() -> Self {
        Self::default()
    }

    /// Returns a copy with the given scope marked managed.
    #[must_use]
    pub fn managed_at(mut self, scope: Scope) -> Self {
        self.managed_scopes.insert(scope);
        self
    }

    /// Returns true if the backend is the store of record at `scope`.
    #[must_use]
    pub fn is_managed(&self, scope: Scope) -> bool {
        self.managed_scopes.contains(&scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_manages_nothing() {
        assert!(!Capability::mirrored().is_managed(Scope::Schema));
    }

    #[test]
    fn managed_at_sets_the_scope() {
        let cap = Capability::mirrored().managed_at(Scope::Schema);
        assert!(cap.is_managed(Scope::Schema));
    }
}
