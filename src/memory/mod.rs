//! In-memory session backends
//!
//! Reference implementations of both session families, backed by an
//! `Arc<tokio::sync::Mutex<…>>` store. Intended for tests and local
//! development; they honor the full session contract — identity assignment,
//! audit timestamps, tombstone visibility rules, snapshot-based per-context
//! transactions, and cancellation — without any external engine.
//!
//! Visibility rules: normal reads and writes see only non-tombstoned rows,
//! trashed reads see only tombstoned rows, and hard deletes ignore tombstone
//! state entirely.

mod document;
mod sql;

pub use document::{MemoryDocumentSession, MemoryDocumentStore};
pub use sql::{MemorySqlSession, MemorySqlStore};

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RepositoryError, RepositoryOperation, RepositoryResult};

/// Serialize an entity for filter evaluation and sorting
pub(crate) fn row_json<T: Serialize>(
    entity: &T,
    operation: RepositoryOperation,
) -> RepositoryResult<Value> {
    serde_json::to_value(entity)
        .map_err(|e| RepositoryError::serialization_error(operation, e.to_string()))
}

/// Total order over JSON values: by type rank first, then by value
///
/// Absent fields sort before present ones. Cross-type comparisons fall back
/// to the rank so sorting stays total.
pub(crate) fn json_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Sort serialized rows by the given `(field, descending)` keys
///
/// Later keys are applied first with a stable sort, making the first key the
/// primary one.
pub(crate) fn sort_rows<T>(rows: &mut [(T, Value)], keys: &[(String, bool)]) {
    for (field, descending) in keys.iter().rev() {
        rows.sort_by(|a, b| {
            let ordering = json_cmp(a.1.get(field), b.1.get(field));
            if *descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Apply sort keys, offset, and limit; the returned count is taken before
/// the window is applied
pub(crate) fn paginate<T>(
    mut rows: Vec<(T, Value)>,
    keys: &[(String, bool)],
    limit: u64,
    offset: u64,
) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    sort_rows(&mut rows, keys);

    let take = if limit == 0 { usize::MAX } else { limit as usize };
    let page = rows
        .into_iter()
        .skip(offset as usize)
        .take(take)
        .map(|(entity, _)| entity)
        .collect();
    (page, total)
}
