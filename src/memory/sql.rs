//! In-memory relational store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{sanitize_connection_url, SqlStoreConfig};
use crate::context::{CallContext, ContextId};
use crate::error::{RepositoryError, RepositoryOperation, RepositoryResult, Result};
use crate::sql::{
    ArchivedAt, SqlEntity, SqlFilter, SqlId, SqlQuery, SqlSession, SqlSessionFactory, SqlSort,
};

use super::{paginate, row_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Live,
    Archived,
    Any,
}

fn visible<T: SqlEntity>(entity: &T, visibility: Visibility) -> bool {
    match visibility {
        Visibility::Live => !entity.archived_at().is_archived(),
        Visibility::Archived => entity.archived_at().is_archived(),
        Visibility::Any => true,
    }
}

fn matching_indices<T>(
    rows: &[T],
    filter: &SqlFilter,
    visibility: Visibility,
    operation: RepositoryOperation,
) -> RepositoryResult<Vec<usize>>
where
    T: SqlEntity + Serialize,
{
    let mut indices = Vec::new();
    for (index, entity) in rows.iter().enumerate() {
        if !visible(entity, visibility) {
            continue;
        }
        if filter.matches(&row_json(entity, operation)?) {
            indices.push(index);
        }
    }
    Ok(indices)
}

fn first_match<T>(
    rows: &[T],
    filter: &SqlFilter,
    visibility: Visibility,
    operation: RepositoryOperation,
) -> RepositoryResult<usize>
where
    T: SqlEntity + Serialize,
{
    matching_indices(rows, filter, visibility, operation)?
        .first()
        .copied()
        .ok_or_else(|| {
            RepositoryError::new(
                operation,
                crate::error::RepositoryErrorKind::NotFound,
                format!("No row in {} matched the filter", T::table_name()),
            )
        })
}

fn matches_example<T: SqlEntity>(example: &T, entity: &T) -> bool {
    (example.slug().is_empty() || example.slug() == entity.slug())
        && (example.name().is_empty() || example.name() == entity.name())
}

fn sort_keys(sort: &SqlSort) -> Vec<(String, bool)> {
    sort.iter()
        .map(|(column, order)| (column.clone(), matches!(order, crate::sql::SqlOrder::Desc)))
        .collect()
}

struct SqlState<T> {
    rows: Vec<T>,
    next_id: SqlId,
    transactions: HashMap<ContextId, (Vec<T>, SqlId)>,
}

/// Session factory backed by process memory
///
/// Identities come from a monotonic sequence that is never reused, even
/// after deletes. Cloning the store shares the underlying rows.
pub struct MemorySqlStore<T> {
    state: Arc<Mutex<SqlState<T>>>,
}

impl<T> Clone for MemorySqlStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> MemorySqlStore<T>
where
    T: SqlEntity + Serialize,
{
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SqlState {
                rows: Vec::new(),
                next_id: 1,
                transactions: HashMap::new(),
            })),
        }
    }

    /// Create a store from validated configuration
    pub fn from_config(config: &SqlStoreConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "In-memory relational store ready: url={}, table={}",
            sanitize_connection_url(&config.url),
            T::table_name()
        );
        Ok(Self::new())
    }
}

impl<T> Default for MemorySqlStore<T>
where
    T: SqlEntity + Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SqlSessionFactory<T> for MemorySqlStore<T>
where
    T: SqlEntity + Serialize,
{
    type Session = MemorySqlSession<T>;

    fn create_with_context(&self, ctx: &CallContext) -> Self::Session {
        MemorySqlSession {
            state: Arc::clone(&self.state),
            ctx: ctx.clone(),
        }
    }
}

/// One unit of work against a [`MemorySqlStore`]
///
/// Transactions snapshot the rows and the identity sequence keyed by the
/// session's context.
pub struct MemorySqlSession<T> {
    state: Arc<Mutex<SqlState<T>>>,
    ctx: CallContext,
}

impl<T> MemorySqlSession<T> {
    fn guard(&self, operation: RepositoryOperation) -> RepositoryResult<()> {
        if self.ctx.is_cancelled() {
            return Err(RepositoryError::cancelled(operation));
        }
        Ok(())
    }
}

fn persist_new<T: SqlEntity>(state: &mut SqlState<T>, mut entity: T) -> T {
    let now = Utc::now();
    if entity.id() == 0 {
        entity.set_id(state.next_id);
        state.next_id += 1;
    }
    entity.set_created_at(now);
    entity.set_updated_at(now);
    state.rows.push(entity.clone());
    entity
}

impl<T> SqlSession<T> for MemorySqlSession<T>
where
    T: SqlEntity + Serialize,
{
    async fn find_one_by_id(&self, id: SqlId) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::FindById)?;
        let state = self.state.lock().await;
        state
            .rows
            .iter()
            .find(|e| e.id() == id && !e.archived_at().is_archived())
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(T::table_name(), id.to_string()))
    }

    async fn find_one(&self, filter: SqlFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::FindOne)?;
        let state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::FindOne,
        )?;
        Ok(state.rows[index].clone())
    }

    async fn find_all(&self, filter: SqlFilter) -> RepositoryResult<Vec<T>> {
        self.guard(RepositoryOperation::FindAll)?;
        let state = self.state.lock().await;
        let indices = matching_indices(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::FindAll,
        )?;
        Ok(indices.into_iter().map(|i| state.rows[i].clone()).collect())
    }

    async fn find_all_with_pagination(&self, query: SqlQuery<T>) -> RepositoryResult<(Vec<T>, u64)> {
        self.guard(RepositoryOperation::FindAll)?;
        let state = self.state.lock().await;
        let mut rows = Vec::new();
        for entity in &state.rows {
            if !visible(entity, Visibility::Live) {
                continue;
            }
            if let Some(example) = &query.filter {
                if !matches_example(example, entity) {
                    continue;
                }
            }
            rows.push((entity.clone(), row_json(entity, RepositoryOperation::FindAll)?));
        }
        Ok(paginate(rows, &sort_keys(&query.sort), query.limit, query.offset))
    }

    async fn insert(&self, entity: T) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::Insert)?;
        let mut state = self.state.lock().await;
        Ok(persist_new(&mut state, entity))
    }

    async fn update(&self, filter: SqlFilter, entity: T) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::Update)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::Update,
        )?;

        let current = &state.rows[index];
        let mut updated = entity;
        updated.set_id(current.id());
        updated.set_created_at(current.created_at());
        updated.set_archived_at(current.archived_at());
        updated.set_updated_at(Utc::now());
        state.rows[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, filter: SqlFilter) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Delete)?;
        let mut state = self.state.lock().await;
        let doomed = matching_indices(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::Delete,
        )?;
        for index in doomed.into_iter().rev() {
            state.rows.remove(index);
        }
        Ok(())
    }

    async fn bulk_insert(&self, entities: Vec<T>) -> RepositoryResult<Vec<T>> {
        self.guard(RepositoryOperation::Insert)?;
        let mut state = self.state.lock().await;
        Ok(entities
            .into_iter()
            .map(|entity| persist_new(&mut state, entity))
            .collect())
    }

    async fn bulk_update(&self, entities: Vec<T>) -> RepositoryResult<Vec<T>> {
        self.guard(RepositoryOperation::Update)?;
        let mut state = self.state.lock().await;
        let mut updated = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if entity.id() == 0 {
                return Err(RepositoryError::new(
                    RepositoryOperation::Update,
                    crate::error::RepositoryErrorKind::NotFound,
                    "Entity has no identity",
                ));
            }
            let index = state
                .rows
                .iter()
                .position(|e| e.id() == entity.id() && !e.archived_at().is_archived())
                .ok_or_else(|| {
                    RepositoryError::not_found(T::table_name(), entity.id().to_string())
                })?;
            entity.set_created_at(state.rows[index].created_at());
            entity.set_updated_at(Utc::now());
            state.rows[index] = entity.clone();
            updated.push(entity);
        }
        Ok(updated)
    }

    async fn bulk_delete(&self, filters: Vec<SqlFilter>) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Delete)?;
        let mut state = self.state.lock().await;
        for filter in filters {
            let doomed = matching_indices(
                &state.rows,
                &filter,
                Visibility::Live,
                RepositoryOperation::Delete,
            )?;
            for index in doomed.into_iter().rev() {
                state.rows.remove(index);
            }
        }
        Ok(())
    }

    async fn soft_delete(&self, filter: SqlFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::SoftDelete)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::SoftDelete,
        )?;
        state.rows[index].set_archived_at(ArchivedAt::at(Utc::now()));
        Ok(state.rows[index].clone())
    }

    async fn hard_delete(&self, filter: SqlFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::HardDelete)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Any,
            RepositoryOperation::HardDelete,
        )?;
        Ok(state.rows.remove(index))
    }

    async fn bulk_soft_delete(&self, filters: Vec<SqlFilter>) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::SoftDelete)?;
        let mut state = self.state.lock().await;
        for filter in filters {
            let index = first_match(
                &state.rows,
                &filter,
                Visibility::Live,
                RepositoryOperation::SoftDelete,
            )?;
            state.rows[index].set_archived_at(ArchivedAt::at(Utc::now()));
        }
        Ok(())
    }

    async fn bulk_hard_delete(&self, filters: Vec<SqlFilter>) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::HardDelete)?;
        let mut state = self.state.lock().await;
        for filter in filters {
            let index = first_match(
                &state.rows,
                &filter,
                Visibility::Any,
                RepositoryOperation::HardDelete,
            )?;
            state.rows.remove(index);
        }
        Ok(())
    }

    async fn get_trashed(&self) -> RepositoryResult<Vec<T>> {
        self.guard(RepositoryOperation::GetTrashed)?;
        let state = self.state.lock().await;
        Ok(state
            .rows
            .iter()
            .filter(|e| e.archived_at().is_archived())
            .cloned()
            .collect())
    }

    async fn get_trashed_with_pagination(
        &self,
        query: SqlQuery<T>,
    ) -> RepositoryResult<(Vec<T>, u64)> {
        self.guard(RepositoryOperation::GetTrashed)?;
        let state = self.state.lock().await;
        let mut rows = Vec::new();
        for entity in &state.rows {
            if !visible(entity, Visibility::Archived) {
                continue;
            }
            if let Some(example) = &query.filter {
                if !matches_example(example, entity) {
                    continue;
                }
            }
            rows.push((
                entity.clone(),
                row_json(entity, RepositoryOperation::GetTrashed)?,
            ));
        }
        Ok(paginate(rows, &sort_keys(&query.sort), query.limit, query.offset))
    }

    async fn restore(&self, filter: SqlFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::Restore)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Archived,
            RepositoryOperation::Restore,
        )?;
        state.rows[index].set_archived_at(ArchivedAt::null());
        Ok(state.rows[index].clone())
    }

    async fn restore_all(&self) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Restore)?;
        let mut state = self.state.lock().await;
        for entity in &mut state.rows {
            entity.set_archived_at(ArchivedAt::null());
        }
        Ok(())
    }

    async fn begin_transaction(&self) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Transaction)?;
        let mut state = self.state.lock().await;
        let key = self.ctx.id();
        if state.transactions.contains_key(&key) {
            return Err(RepositoryError::transaction_failed(format!(
                "Transaction already open for context {key}"
            )));
        }
        let snapshot = (state.rows.clone(), state.next_id);
        state.transactions.insert(key, snapshot);
        Ok(())
    }

    async fn commit_transaction(&self) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Transaction)?;
        let mut state = self.state.lock().await;
        let key = self.ctx.id();
        state.transactions.remove(&key).ok_or_else(|| {
            RepositoryError::transaction_failed(format!("No open transaction for context {key}"))
        })?;
        Ok(())
    }

    async fn rollback_transaction(&self) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Transaction)?;
        let mut state = self.state.lock().await;
        let key = self.ctx.id();
        let (rows, next_id) = state.transactions.remove(&key).ok_or_else(|| {
            RepositoryError::transaction_failed(format!("No open transaction for context {key}"))
        })?;
        state.rows = rows;
        state.next_id = next_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::SqlIdentifier;
    use chrono::DateTime;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: SqlId,
        name: String,
        slug: String,
        balance: i64,
        created_at: chrono::DateTime<Utc>,
        updated_at: chrono::DateTime<Utc>,
        archived_at: ArchivedAt,
    }

    impl Account {
        fn new(name: &str, slug: &str, balance: i64) -> Self {
            Self {
                id: 0,
                name: name.to_string(),
                slug: slug.to_string(),
                balance,
                created_at: DateTime::UNIX_EPOCH,
                updated_at: DateTime::UNIX_EPOCH,
                archived_at: ArchivedAt::null(),
            }
        }
    }

    impl SqlEntity for Account {
        fn id(&self) -> SqlId {
            self.id
        }
        fn set_id(&mut self, id: SqlId) {
            self.id = id;
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
        fn created_at(&self) -> chrono::DateTime<Utc> {
            self.created_at
        }
        fn set_created_at(&mut self, at: chrono::DateTime<Utc>) {
            self.created_at = at;
        }
        fn updated_at(&self) -> chrono::DateTime<Utc> {
            self.updated_at
        }
        fn set_updated_at(&mut self, at: chrono::DateTime<Utc>) {
            self.updated_at = at;
        }
        fn archived_at(&self) -> ArchivedAt {
            self.archived_at
        }
        fn set_archived_at(&mut self, at: ArchivedAt) {
            self.archived_at = at;
        }
        fn table_name() -> &'static str {
            "accounts"
        }
    }

    fn session(store: &MemorySqlStore<Account>) -> MemorySqlSession<Account> {
        store.create_with_context(&CallContext::new())
    }

    #[tokio::test]
    async fn test_identities_are_never_reused() {
        let store = MemorySqlStore::new();
        let s = session(&store);

        let first = s.insert(Account::new("First", "first", 10)).await.unwrap();
        assert_eq!(first.id, 1);

        s.hard_delete(SqlIdentifier::new().equal("slug", "first").into_native())
            .await
            .unwrap();
        let second = s.insert(Account::new("Second", "second", 20)).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_find_one_by_id_excludes_archived_rows() {
        let store = MemorySqlStore::new();
        let s = session(&store);

        let account = s.insert(Account::new("Hidden", "hidden", 5)).await.unwrap();
        s.soft_delete(SqlIdentifier::new().equal("slug", "hidden").into_native())
            .await
            .unwrap();

        let error = s.find_one_by_id(account.id).await.expect_err("archived");
        assert_eq!(error.kind, crate::error::RepositoryErrorKind::NotFound);
        assert_eq!(error.entity_type.as_deref(), Some("accounts"));
    }

    #[tokio::test]
    async fn test_bulk_hard_delete_removes_archived_rows() {
        let store = MemorySqlStore::new();
        let s = session(&store);

        s.insert(Account::new("A", "a", 1)).await.unwrap();
        s.insert(Account::new("B", "b", 2)).await.unwrap();
        s.soft_delete(SqlIdentifier::new().equal("slug", "a").into_native())
            .await
            .unwrap();

        s.bulk_hard_delete(vec![
            SqlIdentifier::new().equal("slug", "a").into_native(),
            SqlIdentifier::new().equal("slug", "b").into_native(),
        ])
        .await
        .unwrap();

        assert!(s.find_all(SqlFilter::default()).await.unwrap().is_empty());
        assert!(s.get_trashed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_restores_identity_sequence() {
        let store = MemorySqlStore::new();
        let s = session(&store);

        s.begin_transaction().await.unwrap();
        s.insert(Account::new("Tx", "tx", 1)).await.unwrap();
        s.rollback_transaction().await.unwrap();

        let after = s.insert(Account::new("Next", "next", 2)).await.unwrap();
        assert_eq!(after.id, 1);
    }

    #[tokio::test]
    async fn test_cancelled_context_rejects_insert() {
        let store = MemorySqlStore::new();
        let ctx = CallContext::new();
        let s = store.create_with_context(&ctx);
        ctx.cancel();

        let error = s
            .insert(Account::new("Nope", "nope", 0))
            .await
            .expect_err("cancelled");
        assert_eq!(error.kind, crate::error::RepositoryErrorKind::Cancelled);
    }
}
