//! Typed partial updates.
//!
//! Each game declares an enum of the fields it is allowed to touch, e.g.
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! #[serde(rename_all = "camelCase")]
//! enum DiceField {
//!     Status(String),
//!     Round(u32),
//! }
//! ```
//!
//! serde's externally tagged representation turns `DiceField::Round(2)`
//! into `{"round": 2}`, so a list of fields folds into a single object of
//! top-level writes. A field whose value serializes to `null` deletes the
//! key when the patch is merged.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ProtocolError;

/// A set of top-level key writes, merged into a record by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a list of typed fields into one patch. Later fields win.
    ///
    /// # Errors
    /// - [`ProtocolError::Encode`] if a field fails to serialize.
    /// - [`ProtocolError::InvalidRecord`] if a field doesn't serialize to
    ///   exactly one key (i.e. it isn't a newtype enum variant).
    pub fn from_fields<F: Serialize>(fields: &[F]) -> Result<Self, ProtocolError> {
        let mut patch = Self::new();
        for field in fields {
            let value = serde_json::to_value(field).map_err(ProtocolError::Encode)?;
            let Value::Object(entry) = value else {
                return Err(ProtocolError::InvalidRecord(format!(
                    "patch field must serialize to a single key, got {value}"
                )));
            };
            if entry.len() != 1 {
                return Err(ProtocolError::InvalidRecord(format!(
                    "patch field must serialize to a single key, got {} keys",
                    entry.len()
                )));
            }
            patch.fields.extend(entry);
        }
        Ok(patch)
    }

    /// Sets one raw key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Sets one key from a typed value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value fails to serialize.
    pub fn insert_serialized<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, ProtocolError> {
        let value = serde_json::to_value(value).map_err(ProtocolError::Encode)?;
        Ok(self.insert(key, value))
    }

    /// Merges another patch on top of this one.
    pub fn merge(&mut self, other: Patch) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the patch, returning the raw key/value writes.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}
