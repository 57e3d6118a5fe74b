//! Session collaborator contract for the relational store
//!
//! The relational twin of the document session contract: one unit of work
//! per call context, native filter/sort types, failures surfaced as the
//! implementation's own [`RepositoryResult`] errors.

use std::future::Future;

use crate::context::CallContext;
use crate::error::RepositoryResult;

use super::filter::{SqlFilter, SqlSort};
use super::model::{SqlEntity, SqlId};

/// Native query shape handed to a session for paginated reads
#[derive(Debug, Clone)]
pub struct SqlQuery<T> {
    /// Optional by-example filter; matching semantics are the session's
    pub filter: Option<T>,
    /// Maximum number of results (0 = no limit)
    pub limit: u64,
    /// Number of results to skip
    pub offset: u64,
    /// Native ORDER BY mapping
    pub sort: SqlSort,
    /// Related-data inclusion names
    pub include: Vec<String>,
}

/// One unit of work against the relational backend
pub trait SqlSession<T: SqlEntity>: Send + Sync {
    fn find_one_by_id(&self, id: SqlId) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn find_one(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn find_all(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    fn find_all_with_pagination(
        &self,
        query: SqlQuery<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    fn insert(&self, entity: T) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn update(
        &self,
        filter: SqlFilter,
        entity: T,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn delete(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn bulk_insert(&self, entities: Vec<T>)
        -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    fn bulk_update(&self, entities: Vec<T>)
        -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    fn bulk_delete(
        &self,
        filters: Vec<SqlFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn soft_delete(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn hard_delete(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn bulk_soft_delete(
        &self,
        filters: Vec<SqlFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn bulk_hard_delete(
        &self,
        filters: Vec<SqlFilter>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn get_trashed(&self) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    fn get_trashed_with_pagination(
        &self,
        query: SqlQuery<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    fn restore(&self, filter: SqlFilter) -> impl Future<Output = RepositoryResult<T>> + Send;

    fn restore_all(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn begin_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn commit_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn rollback_transaction(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// Produces sessions scoped to a call context
pub trait SqlSessionFactory<T: SqlEntity>: Send + Sync {
    /// The session type this factory produces
    type Session: SqlSession<T>;

    /// Create a session scoped to the given context
    fn create_with_context(&self, ctx: &CallContext) -> Self::Session;
}
