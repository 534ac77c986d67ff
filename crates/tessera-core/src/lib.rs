//! # tessera-core
//!
//! The embeddable in-memory object store for Tessera - THE LOGIC.
//!
//! This crate implements two cooperating primitives: a generic keyed-record
//! collection with criteria-based query/update/delete, and a ternary
//! relation store (subject, role, object) with directional neighbor queries
//! and cycle-safe transitive closure over hierarchical relations.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is purely in-memory and synchronous; it performs no I/O and defines no
//!   wire protocol (the snapshot format moves bytes, callers move files)
//! - Is deterministic: `BTreeMap`/`BTreeSet` everywhere, integer arithmetic
//!   only
//! - Defines no internal locking; embedding callers serialize access
//! - Delegates identifier generation and class decoding to trait seams
//!   ([`ident::IdSource`], [`oid::ClassCodec`])
//! - Never panics in non-test code; every failure is a [`StoreError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod closure;
pub mod collection;
pub mod criteria;
pub mod formats;
pub mod ident;
pub mod oid;
pub mod primitives;
pub mod relation;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ClassId, Edge, FIELD_OBJECT, FIELD_ROLE, FIELD_SUBJECT, ID_FIELD, ObjectId, Record, RoleId,
    StoreError, Value,
};

// =============================================================================
// RE-EXPORTS: Store Engine
// =============================================================================

pub use closure::transitive_reach;
pub use collection::{Collection, FindQuery};
pub use criteria::{CriteriaSpec, Matcher, Predicate};
pub use ident::{IdSource, SequentialSource, UuidSource};
pub use oid::{ClassCodec, DotCodec};
pub use relation::{Direction, RelationSet};
pub use store::Store;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{Snapshot, SnapshotHeader};
