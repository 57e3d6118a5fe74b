//! Pagination and ordering descriptors for repository queries
//!
//! [`QueryParams`] is built by the caller per request and translated by the
//! facade into each backend's native query shape. It has no lifecycle of its
//! own beyond the call it is passed to.

use std::collections::BTreeMap;
use std::fmt;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Field-to-direction sort mapping
///
/// Field names are unique; inserting a direction for a field that is already
/// present replaces it. Iteration order is the map's key order — callers
/// must not rely on insertion order.
pub type SortMap = BTreeMap<String, SortDirection>;

/// Query parameters for paginated repository reads
///
/// `limit == 0` means unbounded. `total` counts in paginated results are
/// always computed before `limit`/`offset` are applied.
///
/// # Example
///
/// ```rust
/// use unirepo::query::{QueryParams, SortDirection};
///
/// let params: QueryParams<()> = QueryParams::new(20, 40)
///     .sorted_by("created_at", SortDirection::Descending);
/// assert_eq!(params.limit, 20);
/// assert_eq!(params.offset, 40);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams<T> {
    /// Optional by-example filter; matching semantics are backend-defined
    pub filter: Option<T>,
    /// Maximum number of results to return (0 = no limit)
    pub limit: u64,
    /// Number of results to skip
    pub offset: u64,
    /// Sort mapping, translated 1:1 into the backend's native sort shape
    pub sort: SortMap,
    /// Names of related data to load alongside the entities; interpretation
    /// is entirely the session's concern
    pub include: Vec<String>,
}

impl<T> QueryParams<T> {
    /// Create query parameters with the given limit and offset
    #[must_use]
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            filter: None,
            limit,
            offset,
            sort: SortMap::new(),
            include: Vec::new(),
        }
    }

    /// Create parameters for the first page with the given limit
    #[must_use]
    pub fn first_page(limit: u64) -> Self {
        Self::new(limit, 0)
    }

    /// Set the by-example filter
    #[must_use]
    pub fn filtered_by(mut self, example: T) -> Self {
        self.filter = Some(example);
        self
    }

    /// Add a sort field; repeating a field replaces its direction
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.insert(field.into(), direction);
        self
    }

    /// Add a related-data inclusion name
    #[must_use]
    pub fn including(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }
}

impl<T> Default for QueryParams<T> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_display() {
        assert_eq!(format!("{}", SortDirection::Ascending), "asc");
        assert_eq!(format!("{}", SortDirection::Descending), "desc");
    }

    #[test]
    fn test_sort_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Ascending);
    }

    #[test]
    fn test_last_write_per_field_wins() {
        let params: QueryParams<()> = QueryParams::first_page(10)
            .sorted_by("name", SortDirection::Ascending)
            .sorted_by("name", SortDirection::Descending);

        assert_eq!(params.sort.len(), 1);
        assert_eq!(params.sort["name"], SortDirection::Descending);
    }

    #[test]
    fn test_builder_accumulates() {
        let params: QueryParams<()> = QueryParams::new(5, 15)
            .sorted_by("age", SortDirection::Descending)
            .including("orders");

        assert_eq!(params.limit, 5);
        assert_eq!(params.offset, 15);
        assert_eq!(params.include, vec!["orders".to_string()]);
    }

    #[test]
    fn test_default_is_unbounded() {
        let params: QueryParams<()> = QueryParams::default();
        assert_eq!(params.limit, 0);
        assert_eq!(params.offset, 0);
        assert!(params.sort.is_empty());
    }
}
