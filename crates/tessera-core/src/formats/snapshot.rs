//! # Store Snapshot Format
//!
//! Binary serialization of a whole [`Store`]: every collection, every
//! relation edge, and the per-class instance table.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot data.
//! - 4 bytes: Magic (`TESS`)
//! - 1 byte: Version
//!
//! ## Validation
//!
//! Imports are validated before use: payload size is checked before
//! deserialization, the header before the payload, and record/edge counts
//! against hard limits after parsing. Corrupted data surfaces as
//! `DeserializationError`, never a panic.

use crate::collection::Collection;
use crate::primitives::{
    FORMAT_VERSION, MAGIC_BYTES, MAX_IMPORT_EDGE_COUNT, MAX_IMPORT_RECORD_COUNT,
    MAX_SNAPSHOT_PAYLOAD_SIZE,
};
use crate::relation::RelationSet;
use crate::store::Store;
use crate::types::{ClassId, Edge, ObjectId, Record, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum valid snapshot size (header only).
const MIN_SNAPSHOT_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The snapshot header precedes all store data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes identifying the format.
    pub magic: [u8; 4],
    /// Format version for compatibility.
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header against the current format.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.magic != *MAGIC_BYTES {
            return Err(StoreError::DeserializationError(
                "not a tessera snapshot".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(StoreError::DeserializationError(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A complete, owned copy of a store's contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    /// Collection name → records, in key order.
    pub collections: BTreeMap<String, Vec<Record>>,
    /// All relation edges, in value order.
    pub edges: Vec<Edge>,
    /// Class id → instance records, in key order.
    pub instances: BTreeMap<ClassId, Vec<Record>>,
}

impl Snapshot {
    /// Capture the current contents of a store.
    #[must_use]
    pub fn capture(store: &Store) -> Self {
        let collections = store
            .collections()
            .map(|(name, coll)| (name.clone(), coll.records().cloned().collect()))
            .collect();
        let edges = store.related().iter().cloned().collect();
        let instances = store
            .instance_table()
            .iter()
            .map(|(class, bucket)| (class.clone(), bucket.values().cloned().collect()))
            .collect();
        Self {
            collections,
            edges,
            instances,
        }
    }

    /// Total record count across collections and instance buckets.
    #[must_use]
    pub fn record_count(&self) -> u64 {
        let in_collections: usize = self.collections.values().map(Vec::len).sum();
        let in_instances: usize = self.instances.values().map(Vec::len).sum();
        (in_collections + in_instances) as u64
    }

    /// Serialize: header bytes followed by the postcard payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let header = SnapshotHeader::new();
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&header.magic);
        out.push(header.version);
        let payload = postcard::to_stdvec(self)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Deserialize and validate a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < MIN_SNAPSHOT_SIZE {
            return Err(StoreError::DeserializationError(
                "snapshot data is truncated".to_string(),
            ));
        }
        if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
            return Err(StoreError::DeserializationError(format!(
                "snapshot of {} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_SNAPSHOT_PAYLOAD_SIZE
            )));
        }

        let header = SnapshotHeader {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: bytes[4],
        };
        header.validate()?;

        let snapshot: Snapshot = postcard::from_bytes(&bytes[MIN_SNAPSHOT_SIZE..])
            .map_err(|e| StoreError::DeserializationError(e.to_string()))?;

        if snapshot.record_count() > MAX_IMPORT_RECORD_COUNT {
            return Err(StoreError::DeserializationError(
                "snapshot record count exceeds import limit".to_string(),
            ));
        }
        if snapshot.edges.len() as u64 > MAX_IMPORT_EDGE_COUNT {
            return Err(StoreError::DeserializationError(
                "snapshot edge count exceeds import limit".to_string(),
            ));
        }
        Ok(snapshot)
    }

    /// Load this snapshot's contents into `store`, replacing whatever it
    /// held.
    pub fn apply_to(self, store: &mut Store) -> Result<(), StoreError> {
        store.drop_database();
        for (name, records) in self.collections {
            store.install_collection(name, Collection::from_records(records)?);
        }
        store.install_related(RelationSet::from_edges(self.edges));
        for (class, records) in self.instances {
            let mut bucket: BTreeMap<ObjectId, Record> = BTreeMap::new();
            for record in records {
                let id = record.id().ok_or_else(|| {
                    StoreError::InvalidArgument(
                        "instance record without id in snapshot".to_string(),
                    )
                })?;
                bucket.insert(id, record);
            }
            store.install_instances(class, bucket);
        }
        Ok(())
    }

    /// Build a fresh store (default collaborators) from this snapshot.
    pub fn restore(self) -> Result<Store, StoreError> {
        let mut store = Store::new();
        self.apply_to(&mut store)?;
        Ok(store)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoleId;

    fn populated_store() -> Store {
        let mut store = Store::new();
        let role = store.add_role("tag_applies").expect("role");
        let tag = store
            .insert_into("tags", Record::new().with("name", "urgent"))
            .expect("tag");
        store.relate(ObjectId::new("o1"), role, tag);
        store
            .create_object(&ClassId::new("person"), Record::new().with("name", "ada"))
            .expect("create");
        store
    }

    #[test]
    fn capture_restore_round_trip() {
        let store = populated_store();
        let bytes = Snapshot::capture(&store).to_bytes().expect("encode");
        let restored = Snapshot::from_bytes(&bytes)
            .expect("decode")
            .restore()
            .expect("restore");

        assert_eq!(restored.related().len(), store.related().len());
        assert_eq!(restored.get_metadata(), store.get_metadata());
        assert_eq!(
            restored.list_collection_names(),
            store.list_collection_names()
        );
        assert_eq!(
            restored.instances(&ClassId::new("person")).map(BTreeMap::len),
            store.instances(&ClassId::new("person")).map(BTreeMap::len)
        );
    }

    #[test]
    fn restored_store_answers_queries() {
        let store = populated_store();
        let bytes = Snapshot::capture(&store).to_bytes().expect("encode");
        let restored = Snapshot::from_bytes(&bytes)
            .expect("decode")
            .restore()
            .expect("restore");

        let tags = restored
            .get_object_tags(&ObjectId::new("o1"))
            .expect("tags");
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn truncated_data_is_rejected() {
        assert!(matches!(
            Snapshot::from_bytes(b"TES"),
            Err(StoreError::DeserializationError(_))
        ));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = Snapshot::default().to_bytes().expect("encode");
        bytes[0] = b'X';
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(StoreError::DeserializationError(_))
        ));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = Snapshot::default().to_bytes().expect("encode");
        bytes[4] = FORMAT_VERSION.wrapping_add(1);
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(StoreError::DeserializationError(_))
        ));
    }

    #[test]
    fn corrupted_payload_is_an_error_not_a_panic() {
        let mut bytes = Snapshot::capture(&populated_store())
            .to_bytes()
            .expect("encode");
        let len = bytes.len();
        bytes.truncate(len - 3);
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(StoreError::DeserializationError(_))
        ));
    }

    #[test]
    fn duplicate_edges_collapse_on_restore() {
        let mut snapshot = Snapshot::capture(&populated_store());
        let edge = Edge::new(
            ObjectId::new("x"),
            RoleId::new("r"),
            ObjectId::new("y"),
        );
        snapshot.edges.push(edge.clone());
        snapshot.edges.push(edge);

        let restored = snapshot.restore().expect("restore");
        // One original edge plus one deduplicated extra.
        assert_eq!(restored.related().len(), 2);
    }
}
