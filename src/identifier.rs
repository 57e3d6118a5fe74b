//! Backend-selecting query identifier
//!
//! [`Identifier`] lets callers express a filter once and have it apply
//! correctly to whichever backend executes it. The target backend is chosen
//! at construction time through the type parameter: an
//! [`Identifier<DocumentFilter>`](crate::document::DocumentFilter) can only
//! materialize into the document store's native filter shape, an
//! [`Identifier<SqlFilter>`](crate::sql::SqlFilter) only into the relational
//! one. Asking for the other family's representation is a type error, not a
//! runtime condition.
//!
//! Builder methods cannot fail. No validation is performed on field names or
//! values; a malformed predicate surfaces as whatever error the executing
//! session produces.
//!
//! # Example
//!
//! ```rust
//! use unirepo::identifier::DocumentIdentifier;
//!
//! let filter = DocumentIdentifier::new()
//!     .equal("status", "active")
//!     .greater_than("age", 18)
//!     .like("email", "%@example.com");
//!
//! assert!(filter.has("status"));
//! let native = filter.into_native();
//! assert!(!native.is_empty());
//! ```

use std::marker::PhantomData;

use crate::filter::{FilterValue, Predicate, PredicateMap};

pub(crate) mod sealed {
    /// Restricts [`super::NativeFilter`] to the two in-crate filter shapes.
    pub trait Sealed {}
}

/// A backend-native filter shape an [`Identifier`] can materialize into
///
/// Implemented by exactly [`crate::document::DocumentFilter`] and
/// [`crate::sql::SqlFilter`]; the trait is sealed.
pub trait NativeFilter: sealed::Sealed + Sized {
    /// Build the native representation from accumulated predicates
    fn from_predicates(predicates: PredicateMap) -> Self;
}

/// Fluent filter builder targeting one backend family
///
/// Predicates are keyed by `(field, operator)`: repeating an operator on a
/// field replaces the earlier predicate, while different operators on the
/// same field accumulate. The identifier is consumed by [`into_native`]
/// (or by the facade method it is passed to) and cannot be reused.
///
/// [`into_native`]: Identifier::into_native
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier<F: NativeFilter> {
    predicates: PredicateMap,
    _native: PhantomData<fn() -> F>,
}

/// Identifier targeting the document store
pub type DocumentIdentifier = Identifier<crate::document::DocumentFilter>;

/// Identifier targeting the relational store
pub type SqlIdentifier = Identifier<crate::sql::SqlFilter>;

impl<F: NativeFilter> Identifier<F> {
    /// Create an empty identifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: PredicateMap::new(),
            _native: PhantomData,
        }
    }

    /// Record `field = value`
    #[must_use]
    pub fn equal(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field.into(), Predicate::Equal(value.into()))
    }

    /// Record `field > value`
    #[must_use]
    pub fn greater_than(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field.into(), Predicate::GreaterThan(value.into()))
    }

    /// Record `field < value`
    #[must_use]
    pub fn less_than(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field.into(), Predicate::LessThan(value.into()))
    }

    /// Record `low <= field <= high`
    #[must_use]
    pub fn between(
        self,
        field: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Self {
        self.insert(field.into(), Predicate::Between(low.into(), high.into()))
    }

    /// Record `field LIKE pattern` (`%` and `_` wildcards)
    #[must_use]
    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.insert(field.into(), Predicate::Like(pattern.into()))
    }

    /// Record `field IN (values…)`
    #[must_use]
    pub fn one_of(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<FilterValue>>,
    ) -> Self {
        self.insert(
            field.into(),
            Predicate::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Whether any predicate references `field`
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.predicates.contains_key(field)
    }

    /// Whether the identifier holds no predicates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Consume the identifier and materialize the backend-native filter
    #[must_use]
    pub fn into_native(self) -> F {
        F::from_predicates(self.predicates)
    }

    fn insert(mut self, field: String, predicate: Predicate) -> Self {
        self.predicates
            .entry(field)
            .or_default()
            .insert(predicate.operator(), predicate);
        self
    }
}

impl<F: NativeFilter> Default for Identifier<F> {
    fn default() -> Self {
        Self::new()
    }
}
