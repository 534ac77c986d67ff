//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Tessera store.
//!
//! A store starts with zero data but fixed structure. These constants are
//! compiled into the binary and are immutable at runtime.

/// Names of the meta collections every store owns from construction.
///
/// `related` (the relation store) and the per-class instance table live
/// beside these; see [`crate::store::Store`].
pub const META_KINDS: [&str; 8] = [
    "classes",
    "attributes",
    "roles",
    "tags",
    "groups",
    "queries",
    "changes",
    "schemas",
];

/// Name of the collection holding role records.
pub const ROLES_KIND: &str = "roles";

/// Field of a role record holding its well-known name.
pub const ROLE_NAME_FIELD: &str = "name";

// =============================================================================
// WELL-KNOWN ROLE NAMES
// =============================================================================

/// Role connecting a tag to each object it applies to.
pub const ROLE_TAG_APPLIES: &str = "tag_applies";

/// Role connecting a group to a directly contained subgroup.
pub const ROLE_CONTAINS_GROUP: &str = "contains_group";

/// Role connecting a group to a directly contained object.
pub const ROLE_GROUP_CONTAINS: &str = "group_contains";

// =============================================================================
// IDENTIFIER GENERATION
// =============================================================================

/// Default length of generated identifiers.
pub const DEFAULT_ID_LENGTH: usize = 48;

/// Maximum accepted identifier length.
///
/// Longer requests are clamped by [`crate::ident`] sources to bound memory.
pub const MAX_ID_LENGTH: usize = 256;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the Tessera snapshot format header.
pub const MAGIC_BYTES: &[u8; 4] = b"TESS";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// IMPORT VALIDATION LIMITS
// =============================================================================

/// Maximum allowed snapshot payload size.
///
/// Validated BEFORE deserialization to prevent allocation-based memory
/// exhaustion from corrupted or malicious data.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Maximum allowed record count in snapshot imports.
pub const MAX_IMPORT_RECORD_COUNT: u64 = 1_000_000;

/// Maximum allowed edge count in snapshot imports.
pub const MAX_IMPORT_EDGE_COUNT: u64 = 10_000_000;

// =============================================================================
// TESTS
// =============================================================================
