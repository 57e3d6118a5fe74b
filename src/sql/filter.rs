//! Native filter and sort shapes of the relational store

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::filter::{FilterValue, Predicate, PredicateMap};
use crate::identifier::{sealed, NativeFilter};

/// Direction in a native ORDER BY mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOrder {
    /// ORDER BY … ASC
    Asc,
    /// ORDER BY … DESC
    Desc,
}

impl fmt::Display for SqlOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// Native sort shape: column name to order direction
pub type SqlSort = BTreeMap<String, SqlOrder>;

/// One column condition of a [`SqlFilter`]
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCondition {
    /// The column the condition applies to
    pub column: String,
    /// The predicate to evaluate
    pub predicate: Predicate,
}

/// Native filter of the relational store
///
/// An ordered list of AND-ed column conditions. Sessions backed by a SQL
/// engine render it with [`to_where_clause`](Self::to_where_clause); the
/// in-memory session evaluates it row by row via [`matches`](Self::matches).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFilter {
    conditions: Vec<SqlCondition>,
}

impl sealed::Sealed for SqlFilter {}

impl NativeFilter for SqlFilter {
    fn from_predicates(predicates: PredicateMap) -> Self {
        let conditions = predicates
            .into_iter()
            .flat_map(|(column, by_operator)| {
                by_operator.into_values().map(move |predicate| SqlCondition {
                    column: column.clone(),
                    predicate,
                })
            })
            .collect();
        Self { conditions }
    }
}

impl SqlFilter {
    /// Whether the filter holds no conditions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether any condition references `column`
    #[must_use]
    pub fn has(&self, column: &str) -> bool {
        self.conditions.iter().any(|c| c.column == column)
    }

    /// The individual conditions, in deterministic column order
    #[must_use]
    pub fn conditions(&self) -> &[SqlCondition] {
        &self.conditions
    }

    /// Render an AND-ed WHERE fragment with `$n` placeholders
    ///
    /// Returns the fragment and the bind values in placeholder order. An
    /// empty filter yields an empty fragment; an IN condition over an empty
    /// list renders as `FALSE`.
    #[must_use]
    pub fn to_where_clause(&self) -> (String, Vec<FilterValue>) {
        let mut fragments = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::new();

        for condition in &self.conditions {
            let column = condition.column.as_str();
            match &condition.predicate {
                Predicate::Equal(value) => {
                    values.push(value.clone());
                    fragments.push(format!("{} = ${}", column, values.len()));
                }
                Predicate::GreaterThan(value) => {
                    values.push(value.clone());
                    fragments.push(format!("{} > ${}", column, values.len()));
                }
                Predicate::LessThan(value) => {
                    values.push(value.clone());
                    fragments.push(format!("{} < ${}", column, values.len()));
                }
                Predicate::Between(low, high) => {
                    values.push(low.clone());
                    let low_slot = values.len();
                    values.push(high.clone());
                    fragments.push(format!(
                        "{} BETWEEN ${} AND ${}",
                        column,
                        low_slot,
                        values.len()
                    ));
                }
                Predicate::Like(pattern) => {
                    values.push(FilterValue::String(pattern.clone()));
                    fragments.push(format!("{} LIKE ${}", column, values.len()));
                }
                Predicate::In(list) if list.is_empty() => {
                    fragments.push("FALSE".to_string());
                }
                Predicate::In(list) => {
                    let mut slots = Vec::with_capacity(list.len());
                    for value in list {
                        values.push(value.clone());
                        slots.push(format!("${}", values.len()));
                    }
                    fragments.push(format!("{} IN ({})", column, slots.join(", ")));
                }
            }
        }

        (fragments.join(" AND "), values)
    }

    /// Evaluate the filter against a serialized row
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions
            .iter()
            .all(|c| c.predicate.matches(row.get(&c.column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::SqlIdentifier;
    use serde_json::json;

    #[test]
    fn test_order_display() {
        assert_eq!(format!("{}", SqlOrder::Asc), "ASC");
        assert_eq!(format!("{}", SqlOrder::Desc), "DESC");
    }

    #[test]
    fn test_where_clause_numbering() {
        let filter = SqlIdentifier::new()
            .greater_than("age", 18)
            .between("score", 50, 100)
            .into_native();

        let (clause, values) = filter.to_where_clause();
        assert_eq!(clause, "age > $1 AND score BETWEEN $2 AND $3");
        assert_eq!(
            values,
            vec![
                FilterValue::Integer(18),
                FilterValue::Integer(50),
                FilterValue::Integer(100),
            ]
        );
    }

    #[test]
    fn test_where_clause_in_list() {
        let filter = SqlIdentifier::new()
            .one_of("status", ["active", "pending"])
            .into_native();
        let (clause, values) = filter.to_where_clause();
        assert_eq!(clause, "status IN ($1, $2)");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_empty_in_list_renders_false() {
        let filter = SqlIdentifier::new()
            .one_of("status", Vec::<String>::new())
            .into_native();
        let (clause, values) = filter.to_where_clause();
        assert_eq!(clause, "FALSE");
        assert!(values.is_empty());
    }

    #[test]
    fn test_matches_row() {
        let filter = SqlIdentifier::new()
            .equal("status", "active")
            .less_than("age", 65)
            .into_native();

        assert!(filter.matches(&json!({ "status": "active", "age": 30 })));
        assert!(!filter.matches(&json!({ "status": "active", "age": 70 })));
    }

    #[test]
    fn test_has_column() {
        let filter = SqlIdentifier::new().like("email", "%@example.com").into_native();
        assert!(filter.has("email"));
        assert!(!filter.has("name"));
    }
}
