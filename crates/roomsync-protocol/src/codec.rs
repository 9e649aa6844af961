//! Codec trait and the JSON implementation.
//!
//! The store speaks an untyped JSON tree. A codec converts between that
//! tree and the typed records the room layer works with. Keeping this
//! behind a trait means the room layer never calls `serde_json` directly.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::ProtocolError;

/// Converts typed values to and from the store's value tree.
///
/// `DeserializeOwned` is required because decoded records outlive the
/// snapshot they came from.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a JSON tree.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value, ProtocolError>;

    /// Deserializes a JSON tree back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the tree doesn't match the
    /// expected shape.
    fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`'s value conversions.
///
/// ```rust
/// use roomsync_protocol::{Codec, JsonCodec, RoundTag, Round};
///
/// let codec = JsonCodec;
/// let tree = codec.encode(&RoundTag::Played(Round(3))).unwrap();
/// assert_eq!(tree, serde_json::json!(3));
///
/// let back: RoundTag = codec.decode(tree).unwrap();
/// assert_eq!(back, RoundTag::Played(Round(3)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value, ProtocolError> {
        serde_json::to_value(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, ProtocolError> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParticipantId, RoundTag};

    #[test]
    fn test_decode_wrong_shape_is_decode_error() {
        let result: Result<RoundTag, _> = JsonCodec.decode(serde_json::json!("three"));
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_participant_id_is_plain_string() {
        let tree = JsonCodec.encode(&ParticipantId::new("k3x9")).unwrap();
        assert_eq!(tree, serde_json::json!("k3x9"));
    }
}
