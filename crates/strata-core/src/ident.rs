//! Name identifiers for the unified namespace.
//!
//! Every object Strata coordinates is addressed by an ordered tuple of path
//! levels: `[metalake, catalog, schema, ...]`. A [`Namespace`] is the prefix
//! of such a tuple and a [`NameIdent`] is a namespace plus a leaf name.
//! Schema identifiers have exactly three levels; the first two levels
//! identify the owning catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of levels in a schema identifier.
pub const SCHEMA_IDENT_LEVELS: usize = 3;

/// An ordered prefix of name-path levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Vec<String>);

impl Namespace {
    /// Creates a namespace from the given levels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if any level is empty or contains
    /// a dot.
    pub fn of(levels: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        for level in &levels {
            validate_level(level)?;
        }
        Ok(Self(levels))
    }

    /// Returns the empty namespace.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns the path levels in order.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the namespace has no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reinterprets this namespace as an identifier.
    ///
    /// The last level becomes the leaf name; the remaining levels become the
    /// namespace. Used to address the object a namespace denotes, e.g. the
    /// catalog owning a set of schemas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the namespace is empty.
    pub fn to_ident(&self) -> Result<NameIdent> {
        let (name, prefix) = self.0.split_last().ok_or_else(|| {
            Error::illegal_argument("cannot convert an empty namespace to an identifier")
        })?;
        Ok(NameIdent {
            namespace: Self(prefix.to_vec()),
            name: name.clone(),
        })
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A fully-qualified name: a namespace prefix plus a leaf name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdent {
    namespace: Namespace,
    name: String,
}

impl NameIdent {
    /// Creates an identifier from a namespace and a leaf name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the leaf name is empty or
    /// contains a dot.
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_level(&name)?;
        Ok(Self { namespace, name })
    }

    /// Creates a schema identifier `metalake.catalog.schema`.
    ///
    /// # Panics
    ///
    /// Panics if any level is empty or contains a dot. Intended for literals;
    /// parse untrusted input with [`FromStr`] instead.
    #[must_use]
    pub fn schema(metalake: &str, catalog: &str, schema: &str) -> Self {
        let namespace = Namespace::of([metalake, catalog]).expect("valid namespace levels");
        Self::new(namespace, schema).expect("valid schema name")
    }

    /// Creates a catalog identifier `metalake.catalog`.
    ///
    /// # Panics
    ///
    /// Panics if any level is empty or contains a dot. Intended for literals;
    /// parse untrusted input with [`FromStr`] instead.
    #[must_use]
    pub fn catalog(metalake: &str, catalog: &str) -> Self {
        let namespace = Namespace::of([metalake]).expect("valid namespace level");
        Self::new(namespace, catalog).expect("valid catalog name")
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the leaf name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all path levels, namespace first, leaf last.
    #[must_use]
    pub fn levels(&self) -> Vec<String> {
        let mut levels = self.namespace.0.clone();
        levels.push(self.name.clone());
        levels
    }

    /// Returns the identifier of the catalog owning this object.
    ///
    /// The owning catalog is addressed by the first two path levels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the identifier has fewer than
    /// two levels and therefore no owning catalog.
    pub fn catalog_ident(&self) -> Result<Self> {
        let levels = self.levels();
        if levels.len() < 2 {
            return Err(Error::illegal_argument(format!(
                "identifier '{self}' has no owning catalog"
            )));
        }
        let namespace = Namespace(levels[..1].to_vec());
        Ok(Self {
            namespace,
            name: levels[1].clone(),
        })
    }

    /// Returns true if this identifier addresses a schema (three levels).
    #[must_use]
    pub fn is_schema(&self) -> bool {
        self.namespace.len() == SCHEMA_IDENT_LEVELS - 1
    }
}

impl fmt::Display for NameIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

impl FromStr for NameIdent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut levels: Vec<&str> = s.split('.').collect();
        let name = levels.pop().filter(|n| !n.is_empty()).ok_or_else(|| {
            Error::illegal_argument(format!("invalid identifier '{s}': empty leaf name"))
        })?;
        let namespace = Namespace::of(levels)
            .map_err(|_| Error::illegal_argument(format!("invalid identifier '{s}'")))?;
        Self::new(namespace, name)
    }
}

fn validate_level(level: &str) -> Result<()> {
    if level.is_empty() {
        return Err(Error::illegal_argument("name level must not be empty"));
    }
    if level.contains('.') {
        return Err(Error::illegal_argument(format!(
            "name level '{level}' must not contain '.'"
        )));
    }
    Ok(())
}

/// Requires the namespace to address a catalog's schema set (two levels).
///
/// # Errors
///
/// Returns [`Error::IllegalArgument`] if the namespace does not have exactly
/// two levels.
pub fn require_schema_namespace(namespace: &Namespace) -> Result<()> {
    if namespace.len() != SCHEMA_IDENT_LEVELS - 1 {
        return Err(Error::illegal_argument(format!(
            "schema namespace must have exactly {} levels, got '{namespace}'",
            SCHEMA_IDENT_LEVELS - 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_ident_roundtrip() {
        let ident = NameIdent::schema("lake", "pg", "sales");
        let parsed: NameIdent = ident.to_string().parse().unwrap();
        assert_eq!(ident, parsed);
        assert_eq!(parsed.name(), "sales");
        assert_eq!(parsed.namespace().levels(), ["lake", "pg"]);
    }

    #[test]
    fn catalog_ident_takes_first_two_levels() {
        let ident = NameIdent::schema("lake", "pg", "sales");
        let catalog = ident.catalog_ident().unwrap();
        assert_eq!(catalog.to_string(), "lake.pg");
        assert_eq!(catalog.name(), "pg");
    }

    #[test]
    fn catalog_ident_requires_two_levels() {
        let ident: NameIdent = "lake".parse().unwrap();
        assert!(ident.catalog_ident().is_err());
    }

    #[test]
    fn namespace_to_ident_splits_leaf() {
        let ns = Namespace::of(["lake", "pg"]).unwrap();
        let ident = ns.to_ident().unwrap();
        assert_eq!(ident.to_string(), "lake.pg");
        assert!(Namespace::empty().to_ident().is_err());
    }

    #[test]
    fn empty_and_dotted_levels_rejected() {
        assert!(Namespace::of(["lake", ""]).is_err());
        assert!(Namespace::of(["la.ke"]).is_err());
        assert!("lake..sales".parse::<NameIdent>().is_err());
        assert!("".parse::<NameIdent>().is_err());
    }

    #[test]
    fn schema_namespace_length_enforced() {
        let two = Namespace::of(["lake", "pg"]).unwrap();
        assert!(require_schema_namespace(&two).is_ok());

        let one = Namespace::of(["lake"]).unwrap();
        assert!(require_schema_namespace(&one).is_err());

        let three = Namespace::of(["lake", "pg", "sales"]).unwrap();
        assert!(require_schema_namespace(&three).is_err());
    }

    #[test]
    fn is_schema_checks_level_count() {
        assert!(NameIdent::schema("lake", "pg", "sales").is_schema());
        assert!(!NameIdent::catalog("lake", "pg").is_schema());
    }
}
