//! Repository facade for the document store
//!
//! [`DocumentRepository`] is the uniform contract callers program against;
//! [`DocumentBaseRepository`] adapts any [`DocumentSessionFactory`] to it.
//! The adapter is stateless apart from the factory reference: every
//! operation obtains a fresh session scoped to the caller's context, so one
//! adapter instance can serve concurrent calls. Its only logic is
//! translating identifiers and query descriptors into the session's native
//! shapes; results and errors pass through untouched.

use std::future::Future;
use std::marker::PhantomData;

use crate::context::CallContext;
use crate::error::RepositoryResult;
use crate::identifier::DocumentIdentifier;
use crate::query::{QueryParams, SortDirection, SortMap};

use super::filter::DocumentSort;
use super::model::{DocumentEntity, DocumentId};
use super::session::{DocumentQuery, DocumentSession, DocumentSessionFactory};

/// Uniform repository contract over document entities
///
/// Filters are [`DocumentIdentifier`]s and are consumed by the call. The
/// transaction trio associates state with the supplied context; callers must
/// serialize `begin`/`commit`/`rollback` and the operations meant to run
/// inside the transaction on a single logical sequence of calls sharing that
/// context.
pub trait DocumentRepository<T: DocumentEntity>: Send + Sync {
    /// Find an entity by identity; `NotFound`-kind error when absent
    fn find_one_by_id(
        &self,
        ctx: &CallContext,
        id: DocumentId,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find the first match per the session's ordering; `NotFound` when none
    fn find_one(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Find every match, with no implicit limit
    fn find_all(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Find matches with pagination
    ///
    /// The returned count covers all matches independent of
    /// `limit`/`offset`. An empty sort mapping leaves ordering to the
    /// backend.
    fn find_all_with_pagination(
        &self,
        ctx: &CallContext,
        params: QueryParams<T>,
    ) -> impl Future<Output = RepositoryResult<(Vec<T>, u64)>> + Send;

    /// Persist a new entity; identity and audit timestamps come back populated
    fn insert(&self, ctx: &CallContext, entity: T)
        -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Apply the entity's values to whatever the filter matches
    ///
    /// When the filter and the entity disagree on identity, the filter
    /// governs which record is targeted.
    fn update(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
        entity: T,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove the matched record(s); one-vs-many semantics are
    /// backend-defined
    fn delete(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
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
        filters: Vec<DocumentIdentifier>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Tombstone the matched entity without removing the record
    fn soft_delete(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Permanently remove the matched entity regardless of tombstone state
    fn hard_delete(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Tombstone entities matching each filter
    fn bulk_soft_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<DocumentIdentifier>,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Permanently remove entities matching each filter, tombstoned or not
    fn bulk_hard_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<DocumentIdentifier>,
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
        filter: DocumentIdentifier,
    ) -> impl Future<Output = RepositoryResult<T>> + Send;

    /// Clear every tombstone in the backing store, unconditionally
    ///
    /// Idempotent: once nothing is tombstoned, further calls have no
    /// additional effect. There is no filter and no tenant scoping — the
    /// restore applies store-wide, so treat this as an administrative
    /// operation.
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

    /// Roll back the context's open transaction
    ///
    /// Rollback failures are reported to the caller. For fire-and-forget
    /// cleanup paths use
    /// [`DocumentBaseRepository::rollback_transaction_best_effort`].
    fn rollback_transaction(
        &self,
        ctx: &CallContext,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// Adapts a session factory to the [`DocumentRepository`] contract
pub struct DocumentBaseRepository<T, F> {
    factory: F,
    _entity: PhantomData<fn() -> T>,
}

impl<T, F> DocumentBaseRepository<T, F>
where
    T: DocumentEntity,
    F: DocumentSessionFactory<T>,
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
    /// The underlying error is logged at `warn` and discarded, so callers
    /// cannot distinguish a failed rollback from a successful one. Use the
    /// trait's [`rollback_transaction`](DocumentRepository::rollback_transaction)
    /// when the outcome matters.
    pub async fn rollback_transaction_best_effort(&self, ctx: &CallContext) {
        if let Err(error) = self.factory.create_with_context(ctx).rollback_transaction().await {
            tracing::warn!("Discarding rollback failure for context {}: {}", ctx.id(), error);
        }
    }
}

impl<T, F> DocumentRepository<T> for DocumentBaseRepository<T, F>
where
    T: DocumentEntity,
    F: DocumentSessionFactory<T>,
{
    async fn find_one_by_id(&self, ctx: &CallContext, id: DocumentId) -> RepositoryResult<T> {
        self.factory.create_with_context(ctx).find_one_by_id(id).await
    }

    async fn find_one(&self, ctx: &CallContext, filter: DocumentIdentifier) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .find_one(filter.into_native())
            .await
    }

    async fn find_all(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> RepositoryResult<Vec<T>> {
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
        filter: DocumentIdentifier,
        entity: T,
    ) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .update(filter.into_native(), entity)
            .await
    }

    async fn delete(&self, ctx: &CallContext, filter: DocumentIdentifier) -> RepositoryResult<()> {
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
        filters: Vec<DocumentIdentifier>,
    ) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .bulk_delete(native_filters(filters))
            .await
    }

    async fn soft_delete(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .soft_delete(filter.into_native())
            .await
    }

    async fn hard_delete(
        &self,
        ctx: &CallContext,
        filter: DocumentIdentifier,
    ) -> RepositoryResult<T> {
        self.factory
            .create_with_context(ctx)
            .hard_delete(filter.into_native())
            .await
    }

    async fn bulk_soft_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<DocumentIdentifier>,
    ) -> RepositoryResult<()> {
        self.factory
            .create_with_context(ctx)
            .bulk_soft_delete(native_filters(filters))
            .await
    }

    async fn bulk_hard_delete(
        &self,
        ctx: &CallContext,
        filters: Vec<DocumentIdentifier>,
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

    async fn restore(&self, ctx: &CallContext, filter: DocumentIdentifier) -> RepositoryResult<T> {
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
fn native_sort(sort: &SortMap) -> DocumentSort {
    sort.iter()
        .map(|(field, direction)| {
            let order = match direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            (field.clone(), order)
        })
        .collect()
}

fn native_query<T>(params: QueryParams<T>) -> DocumentQuery<T> {
    DocumentQuery {
        sort: native_sort(&params.sort),
        filter: params.filter,
        limit: params.limit,
        offset: params.offset,
        include: params.include,
    }
}

fn native_filters(filters: Vec<DocumentIdentifier>) -> Vec<super::filter::DocumentFilter> {
    filters.into_iter().map(|filter| filter.into_native()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryErrorKind;
    use crate::identifier::DocumentIdentifier;
    use crate::memory::MemoryDocumentStore;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Article {
        id: Option<DocumentId>,
        name: String,
        email: String,
        slug: String,
        age: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    }

    impl Article {
        fn new(name: &str, email: &str, slug: &str) -> Self {
            Self {
                id: None,
                name: name.to_string(),
                email: email.to_string(),
                slug: slug.to_string(),
                age: 0,
                created_at: DateTime::UNIX_EPOCH,
                updated_at: DateTime::UNIX_EPOCH,
                deleted_at: None,
            }
        }

        fn aged(mut self, age: i64) -> Self {
            self.age = age;
            self
        }
    }

    impl DocumentEntity for Article {
        fn id(&self) -> Option<DocumentId> {
            self.id
        }
        fn set_id(&mut self, id: DocumentId) {
            self.id = Some(id);
        }
        fn slug(&self) -> &str {
            &self.slug
        }
        fn set_slug(&mut self, slug: String) {
            self.slug = slug;
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn set_name(&mut self, name: String) {
            self.name = name;
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
        fn set_created_at(&mut self, at: DateTime<Utc>) {
            self.created_at = at;
        }
        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }
        fn set_updated_at(&mut self, at: DateTime<Utc>) {
            self.updated_at = at;
        }
        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }
        fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
            self.deleted_at = at;
        }
    }

    fn repo() -> DocumentBaseRepository<Article, MemoryDocumentStore<Article>> {
        DocumentBaseRepository::new(MemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn test_insert_find_update_soft_delete_flow() {
        let repo = repo();
        let ctx = CallContext::new();

        let created = repo
            .insert(&ctx, Article::new("Test Entity", "test@example.com", "test-entity"))
            .await
            .expect("insert");
        let id = created.id.expect("identity assigned");
        assert!(created.created_at > DateTime::UNIX_EPOCH);
        assert!(created.updated_at > DateTime::UNIX_EPOCH);

        let found = repo.find_one_by_id(&ctx, id).await.expect("find by id");
        assert_eq!(found.name, "Test Entity");

        let mut changed = found.clone();
        changed.name = "Updated Entity".to_string();
        repo.update(
            &ctx,
            DocumentIdentifier::new().equal("slug", "test-entity"),
            changed,
        )
        .await
        .expect("update");

        let found = repo.find_one_by_id(&ctx, id).await.expect("find after update");
        assert_eq!(found.name, "Updated Entity");

        let trashed = repo
            .soft_delete(&ctx, DocumentIdentifier::new().equal("slug", "test-entity"))
            .await
            .expect("soft delete");
        assert!(trashed.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_bulk_insert_assigns_distinct_identities() {
        let repo = repo();
        let ctx = CallContext::new();

        let created = repo
            .bulk_insert(
                &ctx,
                vec![
                    Article::new("Entity 1", "one@example.com", "entity-1"),
                    Article::new("Entity 2", "two@example.com", "entity-2"),
                ],
            )
            .await
            .expect("bulk insert");

        assert_eq!(created.len(), 2);
        let first = created[0].id.expect("identity");
        let second = created[1].id.expect("identity");
        assert_ne!(first, second);

        let all = repo
            .find_all(&ctx, DocumentIdentifier::new())
            .await
            .expect("find all");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_total_is_independent_of_limit() {
        let repo = repo();
        let ctx = CallContext::new();

        for i in 0..5 {
            repo.insert(
                &ctx,
                Article::new(&format!("A{i}"), "a@example.com", &format!("a-{i}")).aged(i),
            )
            .await
            .expect("insert");
        }

        let params = QueryParams::new(2, 1).sorted_by("age", SortDirection::Ascending);
        let (page, total) = repo
            .find_all_with_pagination(&ctx, params)
            .await
            .expect("paginate");

        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].age, 1);
        assert_eq!(page[1].age, 2);
    }

    #[tokio::test]
    async fn test_descending_sort() {
        let repo = repo();
        let ctx = CallContext::new();

        for i in 0..3 {
            repo.insert(
                &ctx,
                Article::new(&format!("A{i}"), "a@example.com", &format!("a-{i}")).aged(i),
            )
            .await
            .expect("insert");
        }

        let params = QueryParams::first_page(3).sorted_by("age", SortDirection::Descending);
        let (page, _) = repo
            .find_all_with_pagination(&ctx, params)
            .await
            .expect("paginate");
        let ages: Vec<i64> = page.iter().map(|a| a.age).collect();
        assert_eq!(ages, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn test_update_target_is_chosen_by_filter() {
        let repo = repo();
        let ctx = CallContext::new();

        let first = repo
            .insert(&ctx, Article::new("First", "f@example.com", "first"))
            .await
            .expect("insert");
        let second = repo
            .insert(&ctx, Article::new("Second", "s@example.com", "second"))
            .await
            .expect("insert");

        // Entity carries the second row's identity, filter points at the first.
        let mut stray = second.clone();
        stray.name = "Renamed".to_string();
        let updated = repo
            .update(&ctx, DocumentIdentifier::new().equal("slug", "first"), stray)
            .await
            .expect("update");

        assert_eq!(updated.id, first.id);
        assert_eq!(
            repo.find_one_by_id(&ctx, first.id.unwrap()).await.unwrap().name,
            "Renamed"
        );
        assert_eq!(
            repo.find_one_by_id(&ctx, second.id.unwrap()).await.unwrap().name,
            "Second"
        );
    }

    #[tokio::test]
    async fn test_soft_delete_restore_round_trip() {
        let repo = repo();
        let ctx = CallContext::new();

        repo.insert(&ctx, Article::new("Keep", "k@example.com", "keep"))
            .await
            .expect("insert");
        repo.insert(&ctx, Article::new("Trash", "t@example.com", "trash"))
            .await
            .expect("insert");

        repo.soft_delete(&ctx, DocumentIdentifier::new().equal("slug", "trash"))
            .await
            .expect("soft delete");

        let trashed = repo.get_trashed(&ctx).await.expect("trashed");
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].slug, "trash");

        // Tombstoned rows are invisible to normal reads.
        let visible = repo
            .find_all(&ctx, DocumentIdentifier::new())
            .await
            .expect("find all");
        assert_eq!(visible.len(), 1);

        repo.restore(&ctx, DocumentIdentifier::new().equal("slug", "trash"))
            .await
            .expect("restore");
        assert!(repo.get_trashed(&ctx).await.expect("trashed").is_empty());
    }

    #[tokio::test]
    async fn test_restore_all_is_idempotent() {
        let repo = repo();
        let ctx = CallContext::new();

        for slug in ["a", "b"] {
            repo.insert(&ctx, Article::new(slug, "x@example.com", slug))
                .await
                .expect("insert");
            repo.soft_delete(&ctx, DocumentIdentifier::new().equal("slug", slug))
                .await
                .expect("soft delete");
        }
        assert_eq!(repo.get_trashed(&ctx).await.unwrap().len(), 2);

        repo.restore_all(&ctx).await.expect("restore all");
        let after_first = repo.find_all(&ctx, DocumentIdentifier::new()).await.unwrap();

        repo.restore_all(&ctx).await.expect("restore all again");
        let after_second = repo.find_all(&ctx, DocumentIdentifier::new()).await.unwrap();

        assert_eq!(after_first.len(), 2);
        assert_eq!(after_first, after_second);
        assert!(repo.get_trashed(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hard_delete_ignores_tombstone_state() {
        let repo = repo();
        let ctx = CallContext::new();

        repo.insert(&ctx, Article::new("Gone", "g@example.com", "gone"))
            .await
            .expect("insert");
        repo.soft_delete(&ctx, DocumentIdentifier::new().equal("slug", "gone"))
            .await
            .expect("soft delete");

        repo.hard_delete(&ctx, DocumentIdentifier::new().equal("slug", "gone"))
            .await
            .expect("hard delete");
        assert!(repo.get_trashed(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_one_not_found() {
        let repo = repo();
        let ctx = CallContext::new();

        let error = repo
            .find_one(&ctx, DocumentIdentifier::new().equal("slug", "missing"))
            .await
            .expect_err("should be absent");
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_transaction_rollback_restores_state() {
        let repo = repo();
        let ctx = CallContext::new();

        repo.insert(&ctx, Article::new("Base", "b@example.com", "base"))
            .await
            .expect("insert");

        repo.begin_transaction(&ctx).await.expect("begin");
        repo.insert(&ctx, Article::new("Tx", "tx@example.com", "tx"))
            .await
            .expect("insert inside tx");
        assert_eq!(repo.find_all(&ctx, DocumentIdentifier::new()).await.unwrap().len(), 2);

        repo.rollback_transaction(&ctx).await.expect("rollback");
        let rows = repo.find_all(&ctx, DocumentIdentifier::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slug, "base");
    }

    #[tokio::test]
    async fn test_transaction_commit_keeps_changes() {
        let repo = repo();
        let ctx = CallContext::new();

        repo.begin_transaction(&ctx).await.expect("begin");
        repo.insert(&ctx, Article::new("Tx", "tx@example.com", "tx"))
            .await
            .expect("insert inside tx");
        repo.commit_transaction(&ctx).await.expect("commit");

        assert_eq!(repo.find_all(&ctx, DocumentIdentifier::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_reported() {
        let repo = repo();
        let ctx = CallContext::new();

        let error = repo
            .rollback_transaction(&ctx)
            .await
            .expect_err("no open transaction");
        assert_eq!(error.kind, RepositoryErrorKind::TransactionFailed);

        // The explicit best-effort variant swallows the same failure.
        repo.rollback_transaction_best_effort(&ctx).await;
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_operations() {
        let repo = repo();
        let ctx = CallContext::new();
        ctx.cancel();

        let error = repo
            .find_all(&ctx, DocumentIdentifier::new())
            .await
            .expect_err("cancelled");
        assert_eq!(error.kind, RepositoryErrorKind::Cancelled);
    }
}
