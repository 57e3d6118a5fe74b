//! Filter vocabulary shared by both backend families
//!
//! A filter is a set of [`Predicate`]s keyed by field name. The identifier
//! builder accumulates predicates backend-agnostically; each backend's
//! native filter type decides how they materialize (a `$`-operator document
//! for the document store, parameterized WHERE conditions for SQL).
//!
//! # Example
//!
//! ```rust
//! use unirepo::filter::{FilterValue, Predicate};
//!
//! let predicate = Predicate::GreaterThan(FilterValue::Integer(18));
//! assert!(predicate.matches(Some(&serde_json::json!(42))));
//! assert!(!predicate.matches(Some(&serde_json::json!(7))));
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// A value that can be used in filter predicates
///
/// Supports the common scalar types of both backends. Values are never
/// validated here; a field/value mismatch surfaces as whatever error the
/// executing session produces.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of string values (for IN predicates)
    StringList(Vec<String>),
    /// List of integer values (for IN predicates)
    IntegerList(Vec<i64>),
    /// Null value
    Null,
}

impl FilterValue {
    /// Render the value as JSON, the document store's wire representation
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Boolean(b) => Value::Bool(*b),
            Self::StringList(list) => Value::Array(list.iter().cloned().map(Value::String).collect()),
            Self::IntegerList(list) => Value::Array(list.iter().map(|n| Value::from(*n)).collect()),
            Self::Null => Value::Null,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

/// Comparison operators supported by the identifier builder
///
/// The `Display` impl uses the SQL spellings; the document backend maps each
/// operator to its `$`-prefixed equivalent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Greater than (>)
    GreaterThan,
    /// Less than (<)
    LessThan,
    /// Inclusive range (BETWEEN)
    Between,
    /// Pattern matching (LIKE)
    Like,
    /// Value is in a list (IN)
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::LessThan => write!(f, "<"),
            Self::Between => write!(f, "BETWEEN"),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
        }
    }
}

/// A single predicate: an operator plus its payload
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// field = value
    Equal(FilterValue),
    /// field > value
    GreaterThan(FilterValue),
    /// field < value
    LessThan(FilterValue),
    /// low <= field <= high
    Between(FilterValue, FilterValue),
    /// field LIKE pattern (`%` and `_` wildcards)
    Like(String),
    /// field is one of the listed values
    In(Vec<FilterValue>),
}

impl Predicate {
    /// The operator this predicate applies
    pub fn operator(&self) -> FilterOperator {
        match self {
            Self::Equal(_) => FilterOperator::Equal,
            Self::GreaterThan(_) => FilterOperator::GreaterThan,
            Self::LessThan(_) => FilterOperator::LessThan,
            Self::Between(_, _) => FilterOperator::Between,
            Self::Like(_) => FilterOperator::Like,
            Self::In(_) => FilterOperator::In,
        }
    }

    /// Evaluate the predicate against a field value taken from a serialized
    /// entity. `None` means the field is absent, which only a `Null`
    /// equality predicate matches.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Self::Equal(FilterValue::Null) => {
                matches!(actual, None | Some(Value::Null))
            }
            Self::Equal(expected) => {
                actual.is_some_and(|v| compare(v, expected) == Some(Ordering::Equal))
            }
            Self::GreaterThan(expected) => {
                actual.is_some_and(|v| compare(v, expected) == Some(Ordering::Greater))
            }
            Self::LessThan(expected) => {
                actual.is_some_and(|v| compare(v, expected) == Some(Ordering::Less))
            }
            Self::Between(low, high) => actual.is_some_and(|v| {
                matches!(compare(v, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(v, high), Some(Ordering::Less | Ordering::Equal))
            }),
            Self::Like(pattern) => actual
                .and_then(Value::as_str)
                .is_some_and(|s| like_match(pattern, s)),
            Self::In(values) => actual.is_some_and(|v| {
                values
                    .iter()
                    .any(|expected| compare(v, expected) == Some(Ordering::Equal))
            }),
        }
    }
}

/// Predicates keyed by field, then by operator
///
/// The nested map gives each `(field, operator)` pair a single slot, so
/// repeating an operator on a field overwrites the earlier predicate while
/// different operators on the same field coexist.
pub type PredicateMap = BTreeMap<String, BTreeMap<FilterOperator, Predicate>>;

/// Compare a JSON field value against a filter value
///
/// Returns `None` when the two are not comparable (type mismatch); callers
/// treat that as a non-match rather than an error.
pub(crate) fn compare(actual: &Value, expected: &FilterValue) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(n), FilterValue::Integer(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), FilterValue::Float(f)) => n.as_f64()?.partial_cmp(f),
        (Value::String(s), FilterValue::String(other)) => Some(s.as_str().cmp(other.as_str())),
        (Value::Bool(b), FilterValue::Boolean(other)) => Some(b.cmp(other)),
        (Value::Null, FilterValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Translate a SQL LIKE pattern into an anchored regular expression
///
/// `%` matches any run of characters, `_` matches a single character, and
/// everything else is taken literally.
pub(crate) fn like_to_regex(pattern: &str) -> String {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    re
}

fn like_match(pattern: &str, candidate: &str) -> bool {
    regex::Regex::new(&like_to_regex(pattern))
        .map(|re| re.is_match(candidate))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_value_from_impls() {
        assert_eq!(FilterValue::from("test"), FilterValue::String("test".into()));
        assert_eq!(FilterValue::from(42_i32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(42_i64), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(2.5), FilterValue::Float(2.5));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));
        assert_eq!(
            FilterValue::from(vec![1_i64, 2]),
            FilterValue::IntegerList(vec![1, 2])
        );
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(format!("{}", FilterOperator::Equal), "=");
        assert_eq!(format!("{}", FilterOperator::GreaterThan), ">");
        assert_eq!(format!("{}", FilterOperator::LessThan), "<");
        assert_eq!(format!("{}", FilterOperator::Between), "BETWEEN");
        assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
        assert_eq!(format!("{}", FilterOperator::In), "IN");
    }

    #[test]
    fn test_equal_predicate() {
        let p = Predicate::Equal(FilterValue::String("active".into()));
        assert!(p.matches(Some(&json!("active"))));
        assert!(!p.matches(Some(&json!("inactive"))));
        assert!(!p.matches(None));
    }

    #[test]
    fn test_null_equality_matches_absent_field() {
        let p = Predicate::Equal(FilterValue::Null);
        assert!(p.matches(None));
        assert!(p.matches(Some(&Value::Null)));
        assert!(!p.matches(Some(&json!(0))));
    }

    #[test]
    fn test_ordering_predicates() {
        let gt = Predicate::GreaterThan(FilterValue::Integer(18));
        assert!(gt.matches(Some(&json!(19))));
        assert!(!gt.matches(Some(&json!(18))));

        let lt = Predicate::LessThan(FilterValue::Float(2.5));
        assert!(lt.matches(Some(&json!(2.4))));
        assert!(!lt.matches(Some(&json!(3))));
    }

    #[test]
    fn test_between_is_inclusive() {
        let p = Predicate::Between(FilterValue::Integer(50), FilterValue::Integer(100));
        assert!(p.matches(Some(&json!(50))));
        assert!(p.matches(Some(&json!(75))));
        assert!(p.matches(Some(&json!(100))));
        assert!(!p.matches(Some(&json!(101))));
    }

    #[test]
    fn test_like_wildcards() {
        let p = Predicate::Like("%@example.com".into());
        assert!(p.matches(Some(&json!("alice@example.com"))));
        assert!(!p.matches(Some(&json!("alice@example.org"))));

        let single = Predicate::Like("r_te".into());
        assert!(single.matches(Some(&json!("rate"))));
        assert!(!single.matches(Some(&json!("rebate"))));
    }

    #[test]
    fn test_like_escapes_regex_metacharacters() {
        let p = Predicate::Like("a.c%".into());
        assert!(p.matches(Some(&json!("a.cdef"))));
        assert!(!p.matches(Some(&json!("abcdef"))));
    }

    #[test]
    fn test_in_predicate() {
        let p = Predicate::In(vec![
            FilterValue::String("active".into()),
            FilterValue::String("pending".into()),
        ]);
        assert!(p.matches(Some(&json!("pending"))));
        assert!(!p.matches(Some(&json!("archived"))));
    }

    #[test]
    fn test_type_mismatch_is_a_non_match() {
        let p = Predicate::GreaterThan(FilterValue::Integer(10));
        assert!(!p.matches(Some(&json!("not a number"))));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FilterValue::Integer(5).to_json(), json!(5));
        assert_eq!(
            FilterValue::StringList(vec!["a".into(), "b".into()]).to_json(),
            json!(["a", "b"])
        );
        assert_eq!(FilterValue::Null.to_json(), Value::Null);
    }
}
