//! # Serialization Formats
//!
//! Byte-level formats for moving a whole store across the embedding
//! boundary. The core performs no file I/O; callers (such as the CLI app)
//! decide where the bytes live.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotHeader};
