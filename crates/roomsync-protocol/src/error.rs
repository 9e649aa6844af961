//! Error types for the protocol layer.
//!
//! Each crate in Roomsync defines its own error enum. A `ProtocolError`
//! always means a record could not be converted between its typed form
//! and the store's JSON tree.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (typed value → JSON tree).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (JSON tree → typed value).
    ///
    /// Common causes: a field written by a different game, a wrong data
    /// type, or an out-of-range round tag.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value is well-formed JSON but violates a record rule, e.g. a
    /// patch field that does not serialize to a single key.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
