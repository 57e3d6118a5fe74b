//! Relational store backend family
//!
//! Entities in this family carry an integer identity assigned by the
//! backend, an [`ArchivedAt`] tombstone wrapper, and a table name. Filters
//! materialize into parameterized column conditions ([`SqlFilter`]).

mod filter;
mod model;
mod repository;
mod session;

pub use filter::{SqlCondition, SqlFilter, SqlOrder, SqlSort};
pub use model::{ArchivedAt, SqlEntity, SqlId};
pub use repository::{SqlBaseRepository, SqlRepository};
pub use session::{SqlQuery, SqlSession, SqlSessionFactory};
