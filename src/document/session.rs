//! Session collaborator contract for the document store
//!
//! A [`DocumentSession`] represents one unit of work against the document
//! backend, created per call context by a [`DocumentSessionFactory`]. The
//! repository facade translates its own filter/sort types into the native
//! shapes these traits consume and passes results back unmodified. Session
//! failures — including partial-failure policy for bulk operations and the
//! one-vs-many semantics of deletes — are entirely the implementation's
//! concern.
//!
//! Traits use RPITIT (`impl Future … + Send`) for ergonomic async methods
//! without boxing.

use std::future::Future;

use crate::context::CallContext;
use crate::error::RepositoryResult;

use super::filter::{DocumentFilter, DocumentSort};
use super::model::{DocumentEntity, DocumentId};

/// Native query shape handed to a session for paginated reads
#[derive(Debug, Clone)]
pub struct DocumentQuery<T> {
    /// Optional by-example filter; matching semantics are the session's
    pub filter: Option<T>,
    /// Maximum number of results (0 = no limit)
    pub limit: u64,
    /// Number of results to skip
    pub offset: u64,
    /// Native sort mapping (field to `1`/`-1`)
    pub sort: DocumentSort,
    /// Related-data inclusion names
    pub include: Vec<String>,
}

/// One unit of work against the document backend
///
/// The session is already scoped to the call context it was created with:
/// its cancellation and any transaction affinity travel with the session,
/// so methods do not take the context again.
pub trait DocumentSession<T: DocumentEntity>: Send + Sync {
    /// Find an entity by identity
    fn find_one_by_id(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find the first entity matching the filter, in session order
    fn find_one(&self, filter: DocumentFilter)
        -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find every entity matching the filter
    fn find_all(
        &self,
        filter: DocumentFilter,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Find entities with pagination; the count covers all matches
    /// regardless of limit/offset
    fn find_all_with_pagination(
        &self,
        query: DocumentQuery<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    /// Persist a new entity, assigning identity and audit timestamps
    fn insert(&self, entity: T) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Apply the entity's field values to whatever the filter matches
    fn update(
        &self,
        filter: DocumentFilter,
        entity: T,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove matching entities
    fn delete(&self, filter: DocumentFilter) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Persist several new entities
    fn bulk_insert(&self, entities: Vec<T>)
        -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Update several entities by their own identities
    fn bulk_update(&self, entities: Vec<T>)
        -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Permanently remove entities matching each filter
    fn bulk_delete(
        &self,
        filters: Vec<DocumentFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Tombstone the first matching entity
    fn soft_delete(
        &self,
        filter: DocumentFilter,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove the first matching entity, tombstoned or not
    fn hard_delete(
        &self,
        filter: DocumentFilter,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Tombstone entities matching each filter
    fn bulk_soft_delete(
        &self,
        filters: Vec<DocumentFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Permanently remove entities matching each filter, tombstoned or not
    fn bulk_hard_delete(
        &self,
        filters: Vec<DocumentFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// List every tombstoned entity
    fn get_trashed(&self) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// List tombstoned entities with pagination
    fn get_trashed_with_pagination(
        &self,
        query: DocumentQuery<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    /// Clear the tombstone of the first matching entity
    fn restore(&self, filter: DocumentFilter) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Clear every tombstone in the store
    fn restore_all(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Open a transaction for this session's context
    fn begin_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Commit the open transaction
    fn commit_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Roll back the open transaction
    fn rollback_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// Produces sessions scoped to a call context
///
/// Session creation never fails synchronously; a broken backend surfaces
/// through the session's own operations.
pub trait DocumentSessionFactory<T: DocumentEntity>: Send + Sync {
    /// The session type this factory produces
    type Session: DocumentSession<T>;

    /// Create a session scoped to the given context
    fn create_with_context(&self, ctx: &CallContext) -> Self::Session;
}
