//! # Criteria and Predicate Compilation
//!
//! Structured criteria shapes for record queries.
//!
//! - Map a criteria specification to a pure boolean test over one record
//! - Deterministic evaluation (conjunction over sorted field clauses)
//! - A raw scalar where a specification is required is an explicit
//!   `InvalidArgument`, never an implicit "match by id"

use crate::types::{ID_FIELD, Record, StoreError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MATCHERS
// =============================================================================

/// A single-field test within a criteria specification.
///
/// Ordering matchers use the total order on [`Value`]; comparisons are only
/// semantically meaningful between values of the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matcher {
    /// Field equals the value.
    Eq(Value),
    /// Field is present and differs from the value.
    Ne(Value),
    /// Field is strictly greater than the value.
    Gt(Value),
    /// Field is greater than or equal to the value.
    Gte(Value),
    /// Field is strictly less than the value.
    Lt(Value),
    /// Field is less than or equal to the value.
    Lte(Value),
    /// Field equals one of the listed values.
    In(Vec<Value>),
    /// Field presence check: `Exists(true)` requires the field,
    /// `Exists(false)` requires its absence.
    Exists(bool),
}

impl Matcher {
    /// Evaluate this matcher against a field value.
    ///
    /// A missing field (`None`) fails every matcher except `Exists(false)`.
    #[must_use]
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match (self, actual) {
            (Matcher::Exists(expected), _) => *expected == actual.is_some(),
            (_, None) => false,
            (Matcher::Eq(expected), Some(v)) => v == expected,
            (Matcher::Ne(expected), Some(v)) => v != expected,
            (Matcher::Gt(expected), Some(v)) => v > expected,
            (Matcher::Gte(expected), Some(v)) => v >= expected,
            (Matcher::Lt(expected), Some(v)) => v < expected,
            (Matcher::Lte(expected), Some(v)) => v <= expected,
            (Matcher::In(expected), Some(v)) => expected.contains(v),
        }
    }
}

// =============================================================================
// CRITERIA SPECIFICATION
// =============================================================================

/// A criteria specification, compiled into a [`Predicate`] before use.
///
/// The `Scalar` variant exists so that a bare value handed where a
/// specification is required surfaces as an explicit error at compile
/// time rather than being misread as "select by id".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriteriaSpec {
    /// Matches every record.
    All,
    /// Conjunction of per-field matchers.
    Fields(BTreeMap<String, Matcher>),
    /// A raw scalar; always an `InvalidArgument` when compiled.
    Scalar(Value),
}

impl CriteriaSpec {
    /// Criteria matching every record.
    #[must_use]
    pub fn all() -> Self {
        CriteriaSpec::All
    }

    /// Criteria requiring `field == value`.
    #[must_use]
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        CriteriaSpec::Fields(BTreeMap::from([(field.into(), Matcher::Eq(value.into()))]))
    }

    /// Criteria selecting the record with the given id, expressed the only
    /// valid way: as a field specification over [`ID_FIELD`].
    #[must_use]
    pub fn id_eq(id: impl Into<Value>) -> Self {
        Self::field_eq(ID_FIELD, id)
    }

    /// Add a further field clause to this specification.
    ///
    /// On `All` this starts a fresh field map; on `Scalar` the scalar is
    /// kept and the clause ignored, so the compile-time error survives.
    #[must_use]
    pub fn and(self, field: impl Into<String>, matcher: Matcher) -> Self {
        match self {
            CriteriaSpec::All => CriteriaSpec::Fields(BTreeMap::from([(field.into(), matcher)])),
            CriteriaSpec::Fields(mut clauses) => {
                clauses.insert(field.into(), matcher);
                CriteriaSpec::Fields(clauses)
            }
            scalar @ CriteriaSpec::Scalar(_) => scalar,
        }
    }

    /// Compile the specification into a pure boolean test.
    pub fn compile(&self) -> Result<Predicate, StoreError> {
        match self {
            CriteriaSpec::All => Ok(Predicate { clauses: None }),
            CriteriaSpec::Fields(clauses) => Ok(Predicate {
                clauses: Some(clauses.clone()),
            }),
            CriteriaSpec::Scalar(value) => Err(StoreError::InvalidArgument(format!(
                "raw scalar {:?} is not a criteria specification; use a field map such as {{id: ...}}",
                value
            ))),
        }
    }
}

// =============================================================================
// COMPILED PREDICATE
// =============================================================================

/// A compiled criteria specification: a pure boolean test over one record.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// `None` matches everything; otherwise a conjunction of clauses.
    clauses: Option<BTreeMap<String, Matcher>>,
}

impl Predicate {
    /// Evaluate the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match &self.clauses {
            None => true,
            Some(clauses) => clauses
                .iter()
                .all(|(field, matcher)| matcher.matches(record.get(field))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rank: i64) -> Record {
        Record::new().with("name", name).with("rank", rank)
    }

    #[test]
    fn all_matches_everything() {
        let pred = CriteriaSpec::all().compile().expect("compile");
        assert!(pred.matches(&Record::new()));
        assert!(pred.matches(&record("alpha", 1)));
    }

    #[test]
    fn field_eq_filters() {
        let pred = CriteriaSpec::field_eq("name", "alpha")
            .compile()
            .expect("compile");
        assert!(pred.matches(&record("alpha", 1)));
        assert!(!pred.matches(&record("beta", 1)));
        assert!(!pred.matches(&Record::new()));
    }

    #[test]
    fn conjunction_requires_every_clause() {
        let pred = CriteriaSpec::field_eq("name", "alpha")
            .and("rank", Matcher::Gt(Value::Int(3)))
            .compile()
            .expect("compile");
        assert!(pred.matches(&record("alpha", 4)));
        assert!(!pred.matches(&record("alpha", 3)));
        assert!(!pred.matches(&record("beta", 4)));
    }

    #[test]
    fn ordering_and_membership_matchers() {
        let rec = record("alpha", 5);
        assert!(Matcher::Gte(Value::Int(5)).matches(rec.get("rank")));
        assert!(Matcher::Lt(Value::Int(6)).matches(rec.get("rank")));
        assert!(Matcher::In(vec![Value::Int(1), Value::Int(5)]).matches(rec.get("rank")));
        assert!(!Matcher::In(vec![Value::Int(2)]).matches(rec.get("rank")));
    }

    #[test]
    fn exists_matcher_handles_missing_fields() {
        let rec = record("alpha", 1);
        assert!(Matcher::Exists(true).matches(rec.get("name")));
        assert!(Matcher::Exists(false).matches(rec.get("absent")));
        assert!(!Matcher::Ne(Value::Int(0)).matches(rec.get("absent")));
    }

    #[test]
    fn scalar_is_rejected_at_compile() {
        let result = CriteriaSpec::Scalar(Value::Str("some-id".into())).compile();
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn scalar_survives_and_clauses() {
        let spec = CriteriaSpec::Scalar(Value::Int(7)).and("name", Matcher::Exists(true));
        assert!(matches!(spec.compile(), Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn id_eq_builds_field_criteria() {
        let pred = CriteriaSpec::id_eq("x1").compile().expect("compile");
        let rec = Record::new().with("id", "x1");
        assert!(pred.matches(&rec));
    }
}
