//! Document entity identity and capability contract

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque fixed-width identity of a document entity
///
/// Backed by a UUIDv7, so identities assigned later sort after identities
/// assigned earlier.
///
/// # Example
///
/// ```rust
/// use std::str::FromStr;
/// use unirepo::document::DocumentId;
///
/// let id = DocumentId::new();
/// let parsed = DocumentId::from_str(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh identity
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

/// Capability contract a document entity type must satisfy
///
/// Gives the repository facade access to identity, audit, and soft-delete
/// information without requiring a common base type. An unassigned identity
/// is `None`; the backend assigns one on insert.
pub trait DocumentEntity: Clone + Send + Sync + 'static {
    /// The entity's identity, if assigned
    fn id(&self) -> Option<DocumentId>;

    /// Assign the entity's identity
    fn set_id(&mut self, id: DocumentId);

    /// Human-readable slug
    fn slug(&self) -> &str;

    /// Replace the slug
    fn set_slug(&mut self, slug: String);

    /// Display name
    fn name(&self) -> &str;

    /// Replace the display name
    fn set_name(&mut self, name: String);

    /// When the entity was created
    fn created_at(&self) -> DateTime<Utc>;

    /// Set the creation timestamp
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// When the entity was last updated
    fn updated_at(&self) -> DateTime<Utc>;

    /// Set the update timestamp
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// The tombstone timestamp, if the entity is soft-deleted
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the tombstone timestamp
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Whether the entity is currently tombstoned
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().expect("valid uuid");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id));
    }
}
