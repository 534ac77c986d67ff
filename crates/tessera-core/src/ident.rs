//! # Identifier Sources
//!
//! The store never invents identifiers itself; it asks an [`IdSource`].
//!
//! Two sources are provided:
//! - [`UuidSource`]: collision-resistant opaque tokens (the default)
//! - [`SequentialSource`]: deterministic tokens for tests and reproducible
//!   embeddings
//!
//! A caller-supplied source that produces colliding tokens leaves collision
//! behavior undefined at the store level (the dictionary collection
//! overwrites; see [`crate::collection::Collection::insert`]).

use crate::primitives::MAX_ID_LENGTH;
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces unique opaque string identifiers.
///
/// # Extension Point
///
/// This trait is the seam for the embedding application's identifier
/// scheme. Implementors must be pure token factories: no store access,
/// no I/O beyond their own entropy source.
pub trait IdSource: Send + Sync {
    /// Generate a fresh token of approximately the requested length.
    ///
    /// Uniqueness takes precedence over exact length; lengths above
    /// [`MAX_ID_LENGTH`] are clamped.
    fn generate(&self, length: usize) -> String;
}

// =============================================================================
// UUID SOURCE (default)
// =============================================================================

/// Collision-resistant identifier source backed by UUID v4.
///
/// Tokens are lowercase hex with no separators. Requests longer than one
/// UUID concatenate fresh UUIDs until the length is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn generate(&self, length: usize) -> String {
        let length = length.min(MAX_ID_LENGTH);
        let mut token = String::with_capacity(length);
        while token.len() < length {
            token.push_str(&uuid::Uuid::new_v4().simple().to_string());
        }
        token.truncate(length);
        token
    }
}

// =============================================================================
// SEQUENTIAL SOURCE (deterministic)
// =============================================================================

/// Deterministic identifier source: `<prefix><counter>`, zero-padded to the
/// requested length.
///
/// Not collision-resistant across source instances; intended for tests and
/// single-source embeddings that need reproducible ids.
#[derive(Debug, Default)]
pub struct SequentialSource {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialSource {
    /// Create a new source with the given token prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdSource for SequentialSource {
    fn generate(&self, length: usize) -> String {
        let length = length.min(MAX_ID_LENGTH);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut token = format!("{}{}", self.prefix, n);
        while token.len() < length {
            token.insert(self.prefix.len(), '0');
        }
        token
    }
}

// =============================================================================
// TESTS
// =============================================================================
