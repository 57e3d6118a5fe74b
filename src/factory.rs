//! Repository constructors
//!
//! Pure composition: wrap a session factory in the matching facade, or build
//! the in-memory factory from configuration first. Construction fails only
//! when the configuration itself is unusable; that error is surfaced
//! unchanged.

use serde::Serialize;

use crate::config::{DocumentStoreConfig, SqlStoreConfig};
use crate::document::{DocumentBaseRepository, DocumentEntity, DocumentSessionFactory};
use crate::error::Result;
use crate::memory::{MemoryDocumentStore, MemorySqlStore};
use crate::sql::{SqlBaseRepository, SqlEntity, SqlSessionFactory};

/// Wrap a document session factory in the repository facade
#[must_use]
pub fn document_repository<T, F>(factory: F) -> DocumentBaseRepository<T, F>
where
    T: DocumentEntity,
    F: DocumentSessionFactory<T>,
{
    DocumentBaseRepository::new(factory)
}

/// Wrap a relational session factory in the repository facade
#[must_use]
pub fn sql_repository<T, F>(factory: F) -> SqlBaseRepository<T, F>
where
    T: SqlEntity,
    F: SqlSessionFactory<T>,
{
    SqlBaseRepository::new(factory)
}

/// Build an in-memory document repository from configuration
pub fn memory_document_repository<T>(
    config: &DocumentStoreConfig,
) -> Result<DocumentBaseRepository<T, MemoryDocumentStore<T>>>
where
    T: DocumentEntity + Serialize,
{
    Ok(document_repository(MemoryDocumentStore::from_config(config)?))
}

/// Build an in-memory relational repository from configuration
pub fn memory_sql_repository<T>(
    config: &SqlStoreConfig,
) -> Result<SqlBaseRepository<T, MemorySqlStore<T>>>
where
    T: SqlEntity + Serialize,
{
    Ok(sql_repository(MemorySqlStore::from_config(config)?))
}
