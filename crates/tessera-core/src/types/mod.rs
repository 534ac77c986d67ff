//! # Core Type Definitions
//!
//! This module contains all core types for the Tessera in-memory object store:
//! - Opaque identifiers (`ObjectId`, `RoleId`, `ClassId`)
//! - Record representation (`Record`, `Value`)
//! - Relation edges (`Edge`)
//! - Error types (`StoreError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Serialize stably via `serde`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The reserved field name that every stored record carries.
pub const ID_FIELD: &str = "id";

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque unique identifier for a stored object or record.
///
/// Identifiers are produced by an [`crate::ident::IdSource`] and are treated
/// as uninterpreted strings by the store, except for class decoding (see
/// [`crate::oid`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub String);

/// Identifier of a role (an association kind such as `tag_applies`).
///
/// Roles are themselves records in the `roles` collection; a `RoleId` is the
/// `id` of such a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);

/// Identifier of a class. An object's class is derivable from its
/// [`ObjectId`] alone and is never stored redundantly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub String);

macro_rules! string_id_impls {
    ($name:ident) => {
        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id_impls!(ObjectId);
string_id_impls!(RoleId);
string_id_impls!(ClassId);

// =============================================================================
// VALUE
// =============================================================================

/// A field value within a record.
///
/// The variant set is deliberately small and totally ordered, so records can
/// be sorted deterministically by any field tuple. Comparisons across
/// different variants follow the declaration order below; they are only
/// semantically meaningful within a single variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Absent / null value. Sorts before everything else.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// String value.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// View the value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// View the value as an integer, if it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<&ObjectId> for Value {
    fn from(id: &ObjectId) -> Self {
        Value::Str(id.0.clone())
    }
}

impl From<&RoleId> for Value {
    fn from(id: &RoleId) -> Self {
        Value::Str(id.0.clone())
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A schema-free record: a mapping from field name to [`Value`].
///
/// Records place no structural constraint on their fields beyond the store's
/// invariant that a stored record carries an [`ID_FIELD`] equal to its
/// storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Record(pub BTreeMap<String, Value>);

impl Record {
    /// Create a new empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field value, replacing any existing one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Check whether a field is present.
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Get the record's id, if the [`ID_FIELD`] is present and a string.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.get(ID_FIELD)
            .and_then(Value::as_str)
            .map(ObjectId::from)
    }

    /// Set the record's [`ID_FIELD`].
    pub fn set_id(&mut self, id: &ObjectId) {
        self.set(ID_FIELD, Value::from(id));
    }

    /// Merge a patch into this record: every field of `patch` replaces or
    /// adds to the corresponding field here. Field-level merge, no schema
    /// validation.
    pub fn merge(&mut self, patch: &Record) {
        for (field, value) in &patch.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Restrict the record to the given fields, producing an owned copy.
    ///
    /// Fields absent from the record are simply omitted from the result.
    #[must_use]
    pub fn project<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Record {
        let mut out = Record::new();
        for field in fields {
            if let Some(value) = self.0.get(field) {
                out.0.insert(field.to_string(), value.clone());
            }
        }
        out
    }

    /// Iterate over the record's fields in deterministic (sorted) order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

// =============================================================================
// RELATION EDGE
// =============================================================================

/// Field name under which an edge's subject is visible to criteria.
pub const FIELD_SUBJECT: &str = "subject_id";
/// Field name under which an edge's role is visible to criteria.
pub const FIELD_ROLE: &str = "role_id";
/// Field name under which an edge's object is visible to criteria.
pub const FIELD_OBJECT: &str = "object_id";

/// A ternary relation fact: `(subject, role, object)`.
///
/// Edges are compared by value; two edges with identical components are
/// indistinguishable and collapse under set semantics. An edge's existence
/// IS the relationship: it carries no independent lifecycle or id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// The subject endpoint.
    pub subject: ObjectId,
    /// The association kind connecting the endpoints.
    pub role: RoleId,
    /// The object endpoint.
    pub object: ObjectId,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(subject: ObjectId, role: RoleId, object: ObjectId) -> Self {
        Self {
            subject,
            role,
            object,
        }
    }

    /// View the edge as a record, for criteria matching.
    ///
    /// The mapping uses [`FIELD_SUBJECT`], [`FIELD_ROLE`] and
    /// [`FIELD_OBJECT`] as field names.
    #[must_use]
    pub fn as_record(&self) -> Record {
        let mut rec = Record::new();
        rec.set(FIELD_SUBJECT, Value::from(&self.subject));
        rec.set(FIELD_ROLE, Value::from(&self.role));
        rec.set(FIELD_OBJECT, Value::from(&self.object));
        rec
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Tessera store.
///
/// - No silent failures
/// - Use `Result<T, StoreError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum StoreError {
    /// A point lookup or single-result query matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A malformed argument, e.g. a raw scalar where a criteria
    /// specification is required.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required well-known name (e.g. a role) is not registered.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred (app layer only; the core performs no I/O).
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
