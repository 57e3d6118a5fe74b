//! # unirepo
//!
//! Backend-agnostic repository facade over two heterogeneous persistence
//! families: a document store (opaque fixed-width identities, nullable
//! tombstone timestamps) and a relational store (integer identities, an
//! archived-at tombstone wrapper, table names). Callers program against one
//! uniform CRUD / bulk / soft-delete / transaction contract; the actual
//! storage engines stay behind per-family session traits and are consumed,
//! not reimplemented, by this crate.
//!
//! ## Features
//!
//! - **Unified filters**: one fluent builder ([`identifier::Identifier`])
//!   that materializes into either family's native filter shape, with the
//!   target family fixed at the type level
//! - **Uniform contract**: find / paginate / insert / update / delete plus
//!   bulk, soft-delete, trash, restore, and transaction operations with
//!   identical signatures across families
//! - **Session-per-call**: facades are stateless adapters; every operation
//!   runs on a fresh session scoped to a cancellation-bearing call context
//! - **In-memory backends**: full-fidelity reference sessions for tests and
//!   local development
//!
//! ## Example
//!
//! ```rust,ignore
//! use unirepo::prelude::*;
//!
//! // `User` implements DocumentEntity and serde's traits.
//! #[tokio::main]
//! async fn main() -> unirepo::error::Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let document = config.document.expect("document store configured");
//!     let repo = memory_document_repository::<User>(&document)?;
//!     let ctx = CallContext::new();
//!
//!     let user = repo
//!         .insert(&ctx, User::new("Jane Doe", "jane@example.com"))
//!         .await?;
//!
//!     let found = repo
//!         .find_one(&ctx, DocumentIdentifier::new().equal("email", "jane@example.com"))
//!         .await?;
//!     assert_eq!(found.id(), user.id());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod factory;
pub mod filter;
pub mod identifier;
pub mod memory;
pub mod observability;
pub mod query;
pub mod sql;

/// Commonly used types, re-exported for convenience
pub mod prelude {
    pub use crate::config::{Config, DocumentStoreConfig, SqlStoreConfig};
    pub use crate::context::{CallContext, ContextId};
    pub use crate::document::{
        DocumentBaseRepository, DocumentEntity, DocumentFilter, DocumentId, DocumentRepository,
        DocumentSession, DocumentSessionFactory,
    };
    pub use crate::error::{
        Error, RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult, Result,
    };
    pub use crate::factory::{
        document_repository, memory_document_repository, memory_sql_repository, sql_repository,
    };
    pub use crate::filter::{FilterOperator, FilterValue, Predicate};
    pub use crate::identifier::{DocumentIdentifier, Identifier, SqlIdentifier};
    pub use crate::memory::{MemoryDocumentStore, MemorySqlStore};
    pub use crate::observability::init_tracing;
    pub use crate::query::{QueryParams, SortDirection, SortMap};
    pub use crate::sql::{
        ArchivedAt, SqlBaseRepository, SqlEntity, SqlFilter, SqlId, SqlRepository, SqlSession,
        SqlSessionFactory,
    };
}
