//! # Class-Qualified Object Identifiers
//!
//! An object's class is derivable from its identifier alone; the store
//! never records it redundantly. This module provides the decoding seam
//! and a default codec.
//!
//! The default [`DotCodec`] shapes identifiers as `<class>.<token>`, where
//! `<token>` is an opaque string from an [`crate::ident::IdSource`].

use crate::types::{ClassId, ObjectId, StoreError};

/// Derives the owning class from an object identifier, and composes
/// class-qualified identifiers from opaque tokens.
///
/// # Extension Point
///
/// This trait is the seam for the embedding application's identifier
/// encoding. Implementors must be pure: neither direction may consult the
/// store or perform I/O.
pub trait ClassCodec: Send + Sync {
    /// Compose an object id from a class id and an opaque token.
    fn encode(&self, class: &ClassId, token: &str) -> ObjectId;

    /// Decode the owning class id from an object identifier.
    ///
    /// Returns `StoreError::InvalidArgument` if the identifier does not
    /// carry class information.
    fn decode_class(&self, id: &ObjectId) -> Result<ClassId, StoreError>;
}

// =============================================================================
// DOT CODEC (default)
// =============================================================================

/// Separator between class id and token in [`DotCodec`] identifiers.
pub const CLASS_SEPARATOR: char = '.';

/// Default codec: object ids are `<class>.<token>`.
///
/// Hex tokens from [`crate::ident::UuidSource`] never contain the
/// separator, so the first dot unambiguously ends the class id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotCodec;

impl ClassCodec for DotCodec {
    fn encode(&self, class: &ClassId, token: &str) -> ObjectId {
        ObjectId::new(format!("{}{}{}", class.as_str(), CLASS_SEPARATOR, token))
    }

    fn decode_class(&self, id: &ObjectId) -> Result<ClassId, StoreError> {
        match id.as_str().split_once(CLASS_SEPARATOR) {
            Some((class, token)) if !class.is_empty() && !token.is_empty() => {
                Ok(ClassId::new(class))
            }
            _ => Err(StoreError::InvalidArgument(format!(
                "object id '{}' carries no class prefix",
                id
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let codec = DotCodec;
        let class = ClassId::new("cls42");
        let id = codec.encode(&class, "deadbeef");

        assert_eq!(id.as_str(), "cls42.deadbeef");
        assert_eq!(codec.decode_class(&id).expect("decode"), class);
    }

    #[test]
    fn decode_takes_first_separator() {
        let codec = DotCodec;
        let id = ObjectId::new("cls.tok.en");
        assert_eq!(codec.decode_class(&id).expect("decode"), ClassId::new("cls"));
    }

    #[test]
    fn decode_rejects_unqualified_ids() {
        let codec = DotCodec;
        for raw in ["plain", ".token", "class.", "."] {
            let result = codec.decode_class(&ObjectId::new(raw));
            assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
        }
    }
}
