//! Document store backend family
//!
//! Entities in this family carry an opaque fixed-width identity
//! ([`DocumentId`]) and a nullable tombstone timestamp. Filters materialize
//! into a `$`-operator document ([`DocumentFilter`]), the family's native
//! wire shape.

mod filter;
mod model;
mod repository;
mod session;

pub use filter::{DocumentFilter, DocumentSort};
pub use model::{DocumentEntity, DocumentId};
pub use repository::{DocumentBaseRepository, DocumentRepository};
pub use session::{DocumentQuery, DocumentSession, DocumentSessionFactory};
