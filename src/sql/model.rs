//! Relational entity identity and capability contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integer identity of a relational entity; `0` means unassigned
pub type SqlId = i64;

/// Nullable tombstone timestamp of a relational entity
///
/// Semantically equivalent to the document family's `deleted_at` but kept as
/// a distinct wrapper because relational backends expose the column through
/// their own nullable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchivedAt(pub Option<DateTime<Utc>>);

impl ArchivedAt {
    /// Not archived
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Archived at the given instant
    #[must_use]
    pub const fn at(timestamp: DateTime<Utc>) -> Self {
        Self(Some(timestamp))
    }

    /// Whether the entity is archived
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.0.is_some()
    }

    /// The archive timestamp, if set
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.0
    }
}

/// Capability contract a relational entity type must satisfy
///
/// The backend owns identity assignment and audit timestamps; the setters
/// exist so a session implementation can write back what the storage engine
/// decided.
pub trait SqlEntity: Clone + Send + Sync + 'static {
    /// The entity's identity (`0` = unassigned)
    fn id(&self) -> SqlId;

    /// Assign the entity's identity
    fn set_id(&mut self, id: SqlId);

    /// Human-readable slug
    fn slug(&self) -> &str;

    /// Replace the slug
    fn set_slug(&mut self, slug: String);

    /// Display name
    fn name(&self) -> &str;

    /// When the entity was created
    fn created_at(&self) -> DateTime<Utc>;

    /// Set the creation timestamp
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// When the entity was last updated
    fn updated_at(&self) -> DateTime<Utc>;

    /// Set the update timestamp
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// The tombstone state
    fn archived_at(&self) -> ArchivedAt;

    /// Set or clear the tombstone state
    fn set_archived_at(&mut self, at: ArchivedAt);

    /// Name of the table backing this entity type
    fn table_name() -> &'static str;
}
