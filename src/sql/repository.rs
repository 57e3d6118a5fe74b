//! Repository facade for the relational store
//!
//! Mirrors the document facade with the relational identity and native
//! types; see [`crate::document`] for the contract-level documentation. The
//! two facades stay separate because the identity type and tombstone
//! representation differ, not because the behavior does.

use std::future::Future;
use std::marker::PhantomData;

use crate::context::CallContext;
use crate::error::RepositoryResult;
use crate::identifier::SqlIdentifier;
use crate::query::{QueryParams, SortDirection, SortMap};

use super::filter::{SqlOrder, SqlSort};
use super::model::{SqlEntity, SqlId};
use super::session::{SqlQuery, SqlSession, SqlSessionFactory};

/// Uniform repository contract over relational entities
pub trait SqlRepository<T: SqlEntity>: Send + Sync {
    /// Find an entity by identity; `NotFound`-kind error when absent
    fn find_one_by_id(
        &self,
        ctx: &CallContext,
        id: SqlId,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find the first match per the session's ordering; `NotFound` when none
    fn find_one(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find every match, with no implicit limit
    fn find_all(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Find matches with pagination; the count covers all matches
    fn find_all_with_pagination(
        &self,
        ctx: &CallContext,
        params: QueryParams<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    /// Persist a new entity; identity and audit timestamps come back populated
    fn insert(&self, ctx: &CallContext, entity: T)
        -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Apply the entity's values to whatever the filter matches; the filter
    /// governs the target when the two disagree on identity
    fn update(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
        entity: T,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove the matched record(s)
    fn delete(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Persist several new entities
    fn bulk_insert(
        &self,
        ctx: &CallContext,
        entities: Vec<T>,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Update several entities by their own identities
    fn bulk_update(
        &self,
        ctx: &CallContext,
        entities: Vec<T>,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Permanently remove entities matching each filter
    fn bulk_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Tombstone the matched entity without removing the record
    fn soft_delete(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove the matched entity regardless of tombstone state
    fn hard_delete(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Tombstone entities matching each filter
    fn bulk_soft_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Permanently remove entities matching each filter, tombstoned or not
    fn bulk_hard_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// List currently tombstoned entities
    fn get_trashed(&self, ctx: &CallContext)
        -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// List tombstoned entities with pagination
    fn get_trashed_with_pagination(
        &self,
        ctx: &CallContext,
        params: QueryParams<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    /// Clear the matched entity's tombstone
    fn restore(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Clear every tombstone in the backing store, unconditionally;
    /// idempotent and store-wide
    fn restore_all(&self, ctx: &CallContext) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Open a transaction associated with the context
    fn begin_transaction(
        &self,
        ctx: &CallContext,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Commit the context's open transaction
    fn commit_transaction(
        &self,
        ctx: &CallContext,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Roll back the context's open transaction; failures are reported
    fn rollback_transaction(
        &self,
        ctx: &CallContext,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// Adapts a session factory to the [`SqlRepository`] contract
pub struct SqlBaseRepository<T, F> {
    factory: F,
    _entity: PhantomData<fn() -> T>,
}

impl<T, F> SqlBaseRepository<T, F>
where
    T: SqlEntity,
    F: SqlSessionFactory<T>,
{
    /// Wrap a session factory
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _entity: PhantomData,
        }
    }

    /// Roll back the context's transaction, swallowing any failure
    ///
    /// The underlying error is logged at `warn` and discarded. Use the
    /// trait's [`rollback_transaction`](SqlRepository::rollback_transaction)
    /// when the outcome matters.
    pub async fn rollback_transaction_best_effort(&self, ctx: &CallContext) {
        if let Err(error) = self.factory.create_with_context(ctx).rollback_transaction().await {
            tracing::warn!("Discarding rollback failure for context {}: {}", ctx.id(), error);
        }
    }
}

impl<T, F> SqlRepository<T> for SqlBaseRepository<T, F>
where
    T: SqlEntity,
    F: SqlSessionFactory<T>,
{
    async fn find_one_by_id(&self, ctx: &CallContext, id: SqlId) -> RepositoryResult<T> {
        self.factory.create_with_context(ctx).find_one_by_id(id).await
    }

    async fn find_one(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .find_one(filter.into_native())
            .await
    }

    async fn find_all(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<Vec<T>> {
        self.factory
            .create_with_context(ctx)
            .find_all(filter.into_native())
            .await
    }

    async fn find_all_with_pagination(
        &self,
        ctx: &CallContext,
        params: QueryParams<T>,
    ) -> RepositoryResult<(Vec<T>, u64)> {
        self.factory
            .create_with_context(ctx)
            .find_all_with_pagination(native_query(params))
            .await
    }

    async fn insert(&self, ctx: &CallContext, entity: T) -> RepositoryResult<T> {
        self.factory.create_with_context(ctx).insert(entity).await
    }

    async fn update(
        &self,
        ctx: &CallContext,
        filter: SqlIdentifier,
        entity: T,
    ) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .update(filter.into_native(), entity)
            .await
    }

    async fn delete(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .delete(filter.into_native())
            .await
    }

    async fn bulk_insert(&self, ctx: &CallContext, entities: Vec<T>) -> RepositoryResult<Vec<T>> {
        self.factory.create_with_context(ctx).bulk_insert(entities).await
    }

    async fn bulk_update(&self, ctx: &CallContext, entities: Vec<T>) -> RepositoryResult<Vec<T>> {
        self.factory.create_with_context(ctx).bulk_update(entities).await
    }

    async fn bulk_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .bulk_delete(native_filters(filters))
            .await
    }

    async fn soft_delete(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .soft_delete(filter.into_native())
            .await
    }

    async fn hard_delete(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .hard_delete(filter.into_native())
            .await
    }

    async fn bulk_soft_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .bulk_soft_delete(native_filters(filters))
            .await
    }

    async fn bulk_hard_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<SqlIdentifier>,
    ) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .bulk_hard_delete(native_filters(filters))
            .await
    }

    async fn get_trashed(&self, ctx: &CallContext) -> RepositoryResult<Vec<T>> {
        self.factory.create_with_context(ctx).get_trashed().await
    }

    async fn get_trashed_with_pagination(
        &self,
        ctx: &CallContext,
        params: QueryParams<T>,
    ) -> RepositoryResult<(Vec<T>, u64)> {
        self.factory
            .create_with_context(ctx)
            .get_trashed_with_pagination(native_query(params))
            .await
    }

    async fn restore(&self, ctx: &CallContext, filter: SqlIdentifier) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .restore(filter.into_native())
            .await
    }

    async fn restore_all(&self, ctx: &CallContext) -> RepositoryResult<()> {
        self.factory.create_with_context(ctx).restore_all().await
    }

    async fn begin_transaction(&self, ctx: &CallContext) -> RepositoryResult<()> {
        self.factory.create_with_context(ctx).begin_transaction().await
    }

    async fn commit_transaction(&self, ctx: &CallContext) -> RepositoryResult<()> {
        self.factory.create_with_context(ctx).commit_transaction().await
    }

    async fn rollback_transaction(&self, ctx: &CallContext) -> RepositoryResult<()> {
        self.factory.create_with_context(ctx).rollback_transaction().await
    }
}

/// Translate the backend-agnostic sort mapping into the native shape
fn native_sort(sort: &SortMap) -> SqlSort {
    sort.iter()
        .map(|(field, direction)| {
            let order = match direction {
                SortDirection::Ascending => SqlOrder::Asc,
                SortDirection::Descending => SqlOrder::Desc,
            };
            (field.clone(), order)
        })
        .collect()
}

fn native_query<T>(params: QueryParams<T>) -> SqlQuery<T> {
    SqlQuery {
        sort: native_sort(&params.sort),
        filter: params.filter,
        limit: params.limit,
        offset: params.offset,
        include: params.include,
    }
}

fn native_filters(filters: Vec<SqlIdentifier>) -> Vec<super::filter::SqlFilter> {
    filters.into_iter().map(SqlIdentifier::into_native).collect()
}
