//! Audit provenance attached to stored entities.
//!
//! Audit info records who created an entity and when, and who last modified
//! it. The entity store is authoritative for these fields; backend-held
//! metadata never overrides them once an entity exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creator and modifier provenance for an entity.
///
/// Timestamps serialize as ISO-8601 UTC in any external representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    /// Principal that created the entity.
    pub creator: String,

    /// When the entity was created (UTC).
    pub create_time: DateTime<Utc>,

    /// Principal that last modified the entity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modifier: Option<String>,

    /// When the entity was last modified (UTC), if ever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// Creates audit info for a freshly created entity.
    #[must_use]
    pub fn created_by(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            create_time: Utc::now(),
            last_modifier: None,
            last_modified_time: None,
        }
    }

    /// Returns a copy with the modifier fields overwritten.
    ///
    /// Creator and creation time are preserved.
    #[must_use]
    pub fn modified_by(&self, modifier: impl Into<String>) -> Self {
        Self {
            creator: self.creator.clone(),
            create_time: self.create_time,
            last_modifier: Some(modifier.into()),
            last_modified_time: Some(Utc::now()),
        }
    }

    /// Creates a new builder for constructing audit info.
    #[must_use]
    pub fn builder() -> AuditInfoBuilder {
        AuditInfoBuilder::default()
    }
}

/// Builder for [`AuditInfo`].
///
/// Used where audit fields are assembled piecemeal, e.g. when importing
/// metadata whose backend view may or may not carry provenance.
#[derive(Debug, Default)]
pub struct AuditInfoBuilder {
    creator: Option<String>,
    create_time: Option<DateTime<Utc>>,
    last_modifier: Option<String>,
    last_modified_time: Option<DateTime<Utc>>,
}

impl AuditInfoBuilder {
    /// Sets the creator principal.
    #[must_use]
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn create_time(mut self, create_time: DateTime<Utc>) -> Self {
        self.create_time = Some(create_time);
        self
    }

    /// Sets the last modifier principal.
    #[must_use]
    pub fn last_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.last_modifier = Some(modifier.into());
        self
    }

    /// Sets the last modification timestamp.
    #[must_use]
    pub fn last_modified_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_modified_time = Some(time);
        self
    }

    /// Builds the audit info, defaulting creator to the given fallback and
    /// creation time to now when unset.
    #[must_use]
    pub fn build_or_synthesize(self, fallback_principal: &str) -> AuditInfo {
        AuditInfo {
            creator: self
                .creator
                .unwrap_or_else(|| fallback_principal.to_string()),
            create_time: self.create_time.unwrap_or_else(Utc::now),
            last_modifier: self.last_modifier,
            last_modified_time: self.last_modified_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_by_sets_creator_only() {
        let audit = AuditInfo::created_by("alice");
        assert_eq!(audit.creator, "alice");
        assert!(audit.last_modifier.is_none());
        assert!(audit.last_modified_time.is_none());
    }

    #[test]
    fn modified_by_preserves_creation_fields() {
        let audit = AuditInfo::created_by("alice");
        let modified = audit.modified_by("bob");
        assert_eq!(modified.creator, "alice");
        assert_eq!(modified.create_time, audit.create_time);
        assert_eq!(modified.last_modifier.as_deref(), Some("bob"));
        assert!(modified.last_modified_time.is_some());
    }

    #[test]
    fn builder_synthesizes_missing_fields() {
        let audit = AuditInfo::builder().build_or_synthesize("system");
        assert_eq!(audit.creator, "system");

        let audit = AuditInfo::builder()
            .creator("alice")
            .last_modifier("bob")
            .build_or_synthesize("system");
        assert_eq!(audit.creator, "alice");
        assert_eq!(audit.last_modifier.as_deref(), Some("bob"));
    }

    #[test]
    fn serializes_timestamps_as_iso8601() {
        let audit = AuditInfo::created_by("alice");
        let json = serde_json::to_value(&audit).unwrap();
        let ts = json["createTime"].as_str().unwrap();
        assert!(ts.contains('T'), "expected ISO-8601, got {ts}");
        assert!(!json.as_object().unwrap().contains_key("lastModifier"));
    }
}
