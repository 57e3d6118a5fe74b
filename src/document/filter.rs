//! Native filter and sort shapes of the document store

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::filter::{like_to_regex, Predicate, PredicateMap};
use crate::identifier::{sealed, NativeFilter};

/// Native sort shape: field name to `1` (ascending) or `-1` (descending)
pub type DocumentSort = BTreeMap<String, i32>;

/// Native filter of the document store
///
/// Holds the accumulated predicates and renders them as a `$`-operator
/// document on demand. Sessions may either consume the wire shape via
/// [`to_document`](Self::to_document) or evaluate rows directly via
/// [`matches`](Self::matches).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentFilter {
    predicates: PredicateMap,
}

impl sealed::Sealed for DocumentFilter {}

impl NativeFilter for DocumentFilter {
    fn from_predicates(predicates: PredicateMap) -> Self {
        Self { predicates }
    }
}

impl DocumentFilter {
    /// Whether the filter holds no predicates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether any predicate references `field`
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.predicates.contains_key(field)
    }

    /// Render the filter as a `$`-operator document
    ///
    /// Each field maps to an object holding one entry per operator, e.g.
    /// `{"age": {"$gt": 18, "$lt": 65}}`. A `between` predicate expands to
    /// `$gte`/`$lte`, `like` to an anchored `$regex`.
    #[must_use]
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = Map::new();
        for (field, predicates) in &self.predicates {
            let mut conditions = Map::new();
            for predicate in predicates.values() {
                match predicate {
                    Predicate::Equal(value) => {
                        conditions.insert("$eq".to_string(), value.to_json());
                    }
                    Predicate::GreaterThan(value) => {
                        conditions.insert("$gt".to_string(), value.to_json());
                    }
                    Predicate::LessThan(value) => {
                        conditions.insert("$lt".to_string(), value.to_json());
                    }
                    Predicate::Between(low, high) => {
                        conditions.insert("$gte".to_string(), low.to_json());
                        conditions.insert("$lte".to_string(), high.to_json());
                    }
                    Predicate::Like(pattern) => {
                        conditions.insert("$regex".to_string(), Value::String(like_to_regex(pattern)));
                    }
                    Predicate::In(values) => {
                        conditions.insert(
                            "$in".to_string(),
                            Value::Array(values.iter().map(|v| v.to_json()).collect()),
                        );
                    }
                }
            }
            document.insert(field.clone(), Value::Object(conditions));
        }
        document
    }

    /// Evaluate the filter against a serialized entity
    ///
    /// All predicates must match (conjunction). Fields are looked up at the
    /// top level of the serialized object.
    #[must_use]
    pub fn matches(&self, entity: &Value) -> bool {
        self.predicates.iter().all(|(field, predicates)| {
            let actual = entity.get(field);
            predicates.values().all(|p| p.matches(actual))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::identifier::DocumentIdentifier;
    use serde_json::json;

    #[test]
    fn test_between_expands_to_gte_lte() {
        let filter = DocumentIdentifier::new().between("score", 50, 100).into_native();
        assert_eq!(
            filter.to_document()["score"],
            json!({ "$gte": 50, "$lte": 100 })
        );
    }

    #[test]
    fn test_like_renders_anchored_regex() {
        let filter = DocumentIdentifier::new()
            .like("email", "%@example.com")
            .into_native();
        assert_eq!(
            filter.to_document()["email"],
            json!({ "$regex": "^.*@example\\.com$" })
        );
    }

    #[test]
    fn test_in_renders_array() {
        let filter = DocumentIdentifier::new()
            .one_of("status", ["active", "pending"])
            .into_native();
        assert_eq!(
            filter.to_document()["status"],
            json!({ "$in": ["active", "pending"] })
        );
    }

    #[test]
    fn test_matches_is_a_conjunction() {
        let filter = DocumentIdentifier::new()
            .equal("status", "active")
            .greater_than("age", 18)
            .into_native();

        assert!(filter.matches(&json!({ "status": "active", "age": 30 })));
        assert!(!filter.matches(&json!({ "status": "active", "age": 10 })));
        assert!(!filter.matches(&json!({ "status": "inactive", "age": 30 })));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = DocumentIdentifier::new().into_native();
        assert!(filter.is_empty());
        assert!(filter.matches(&json!({ "anything": 1 })));
    }
}
