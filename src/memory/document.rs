//! In-memory document store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{sanitize_connection_url, DocumentStoreConfig};
use crate::context::{CallContext, ContextId};
use crate::document::{
    DocumentEntity, DocumentFilter, DocumentId, DocumentQuery, DocumentSession,
    DocumentSessionFactory,
};
use crate::error::{RepositoryError, RepositoryOperation, RepositoryResult, Result};

use super::{paginate, row_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Live,
    Trashed,
    Any,
}

fn visible<T: DocumentEntity>(entity: &T, visibility: Visibility) -> bool {
    match visibility {
        Visibility::Live => !entity.is_deleted(),
        Visibility::Trashed => entity.is_deleted(),
        Visibility::Any => true,
    }
}

fn matching_indices<T>(
    rows: &[T],
    filter: &DocumentFilter,
    visibility: Visibility,
    operation: RepositoryOperation,
) -> RepositoryResult<Vec<usize>>
where
    T: DocumentEntity + Serialize,
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
    filter: &DocumentFilter,
    visibility: Visibility,
    operation: RepositoryOperation,
) -> RepositoryResult<usize>
where
    T: DocumentEntity + Serialize,
{
    matching_indices(rows, filter, visibility, operation)?
        .first()
        .copied()
        .ok_or_else(|| {
            RepositoryError::new(
                operation,
                crate::error::RepositoryErrorKind::NotFound,
                "No document matched the filter",
            )
        })
}

fn matches_example<T: DocumentEntity>(example: &T, entity: &T) -> bool {
    (example.slug().is_empty() || example.slug() == entity.slug())
        && (example.name().is_empty() || example.name() == entity.name())
}

fn sort_keys(sort: &crate::document::DocumentSort) -> Vec<(String, bool)> {
    sort.iter()
        .map(|(field, order)| (field.clone(), *order < 0))
        .collect()
}

struct DocumentState<T> {
    rows: Vec<T>,
    transactions: HashMap<ContextId, Vec<T>>,
}

/// Session factory backed by process memory
///
/// Cloning the store shares the underlying rows; every session created from
/// the same store (or a clone of it) sees the same data.
pub struct MemoryDocumentStore<T> {
    state: Arc<Mutex<DocumentState<T>>>,
}

impl<T> Clone for MemoryDocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> MemoryDocumentStore<T>
where
    T: DocumentEntity + Serialize,
{
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DocumentState {
                rows: Vec::new(),
                transactions: HashMap::new(),
            })),
        }
    }

    /// Create a store from validated configuration
    pub fn from_config(config: &DocumentStoreConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "In-memory document store ready: url={}, database={}",
            sanitize_connection_url(&config.url),
            config.database
        );
        Ok(Self::new())
    }
}

impl<T> Default for MemoryDocumentStore<T>
where
    T: DocumentEntity + Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DocumentSessionFactory<T> for MemoryDocumentStore<T>
where
    T: DocumentEntity + Serialize,
{
    type Session = MemoryDocumentSession<T>;

    fn create_with_context(&self, ctx: &CallContext) -> Self::Session {
        MemoryDocumentSession {
            state: Arc::clone(&self.state),
            ctx: ctx.clone(),
        }
    }
}

/// One unit of work against a [`MemoryDocumentStore`]
///
/// Transactions snapshot the whole store keyed by the session's context:
/// begin clones the rows, rollback restores the clone, commit discards it.
pub struct MemoryDocumentSession<T> {
    state: Arc<Mutex<DocumentState<T>>>,
    ctx: CallContext,
}

impl<T> MemoryDocumentSession<T> {
    fn guard(&self, operation: RepositoryOperation) -> RepositoryResult<()> {
        if self.ctx.is_cancelled() {
            return Err(RepositoryError::cancelled(operation));
        }
        Ok(())
    }
}

fn persist_new<T: DocumentEntity>(rows: &mut Vec<T>, mut entity: T) -> T {
    let now = Utc::now();
    if entity.id().is_none() {
        entity.set_id(DocumentId::new());
    }
    entity.set_created_at(now);
    entity.set_updated_at(now);
    rows.push(entity.clone());
    entity
}

impl<T> DocumentSession<T> for MemoryDocumentSession<T>
where
    T: DocumentEntity + Serialize,
{
    async fn find_one_by_id(&self, id: DocumentId) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::FindById)?;
        let state = self.state.lock().await;
        state
            .rows
            .iter()
            .find(|e| e.id() == Some(id) && !e.is_deleted())
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("document", id.to_string()))
    }

    async fn find_one(&self, filter: DocumentFilter) -> RepositoryResult<T> {
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

    async fn find_all(&self, filter: DocumentFilter) -> RepositoryResult<Vec<T>> {
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

    async fn find_all_with_pagination(
        &self,
        query: DocumentQuery<T>,
    ) -> RepositoryResult<(Vec<T>, u64)> {
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
        Ok(persist_new(&mut state.rows, entity))
    }

    async fn update(&self, filter: DocumentFilter, entity: T) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::Update)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::Update,
        )?;

        // The filter decides the target; its identity and creation audit
        // survive whatever the incoming entity claims.
        let current = &state.rows[index];
        let mut updated = entity;
        if let Some(id) = current.id() {
            updated.set_id(id);
        }
        updated.set_created_at(current.created_at());
        updated.set_deleted_at(current.deleted_at());
        updated.set_updated_at(Utc::now());
        state.rows[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, filter: DocumentFilter) -> RepositoryResult<()> {
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
            .map(|entity| persist_new(&mut state.rows, entity))
            .collect())
    }

    async fn bulk_update(&self, entities: Vec<T>) -> RepositoryResult<Vec<T>> {
        self.guard(RepositoryOperation::Update)?;
        let mut state = self.state.lock().await;
        let mut updated = Vec::with_capacity(entities.len());
        for mut entity in entities {
            let id = entity.id().ok_or_else(|| {
                RepositoryError::new(
                    RepositoryOperation::Update,
                    crate::error::RepositoryErrorKind::NotFound,
                    "Entity has no identity",
                )
            })?;
            let index = state
                .rows
                .iter()
                .position(|e| e.id() == Some(id) && !e.is_deleted())
                .ok_or_else(|| RepositoryError::not_found("document", id.to_string()))?;
            entity.set_created_at(state.rows[index].created_at());
            entity.set_updated_at(Utc::now());
            state.rows[index] = entity.clone();
            updated.push(entity);
        }
        Ok(updated)
    }

    async fn bulk_delete(&self, filters: Vec<DocumentFilter>) -> RepositoryResult<()> {
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

    async fn soft_delete(&self, filter: DocumentFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::SoftDelete)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Live,
            RepositoryOperation::SoftDelete,
        )?;
        state.rows[index].set_deleted_at(Some(Utc::now()));
        Ok(state.rows[index].clone())
    }

    async fn hard_delete(&self, filter: DocumentFilter) -> RepositoryResult<T> {
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

    async fn bulk_soft_delete(&self, filters: Vec<DocumentFilter>) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::SoftDelete)?;
        let mut state = self.state.lock().await;
        for filter in filters {
            let index = first_match(
                &state.rows,
                &filter,
                Visibility::Live,
                RepositoryOperation::SoftDelete,
            )?;
            state.rows[index].set_deleted_at(Some(Utc::now()));
        }
        Ok(())
    }

    async fn bulk_hard_delete(&self, filters: Vec<DocumentFilter>) -> RepositoryResult<()> {
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
            .filter(|e| e.is_deleted())
            .cloned()
            .collect())
    }

    async fn get_trashed_with_pagination(
        &self,
        query: DocumentQuery<T>,
    ) -> RepositoryResult<(Vec<T>, u64)> {
        self.guard(RepositoryOperation::GetTrashed)?;
        let state = self.state.lock().await;
        let mut rows = Vec::new();
        for entity in &state.rows {
            if !visible(entity, Visibility::Trashed) {
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

    async fn restore(&self, filter: DocumentFilter) -> RepositoryResult<T> {
        self.guard(RepositoryOperation::Restore)?;
        let mut state = self.state.lock().await;
        let index = first_match(
            &state.rows,
            &filter,
            Visibility::Trashed,
            RepositoryOperation::Restore,
        )?;
        state.rows[index].set_deleted_at(None);
        Ok(state.rows[index].clone())
    }

    async fn restore_all(&self) -> RepositoryResult<()> {
        self.guard(RepositoryOperation::Restore)?;
        let mut state = self.state.lock().await;
        for entity in &mut state.rows {
            entity.set_deleted_at(None);
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
        let snapshot = state.rows.clone();
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
        let snapshot = state.transactions.remove(&key).ok_or_else(|| {
            RepositoryError::transaction_failed(format!("No open transaction for context {key}"))
        })?;
        state.rows = snapshot;
        Ok(())
    }
}
