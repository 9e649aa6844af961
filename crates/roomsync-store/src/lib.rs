//! Store abstraction for Roomsync.
//!
//! Provides the [`Store`] trait that abstracts over the hosted real-time
//! database every room lives in: a key-path tree with read, write, merge,
//! delete, a single-key compare-and-set, and push subscriptions.
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryStore`], an in-process implementation
//!   with the same semantics, used by tests and demos.

mod error;
#[cfg(feature = "memory")]
mod memory;
mod subscription;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use subscription::{Snapshot, Subscription};

use std::future::Future;

use roomsync_protocol::Path;
use serde_json::{Map, Value};

/// A hierarchical key-path store.
///
/// Values are JSON trees. Writing `null` (or an empty object) deletes a
/// key. The server-time placeholder
/// ([`Stamp::server_value`](roomsync_protocol::Stamp::server_value)) is
/// replaced with the store's own clock at write time, anywhere inside the
/// written value.
///
/// Writes to one path are applied in order. Nothing is ordered across
/// paths, and concurrent writers race with last-write-wins, except for
/// [`compare_and_set`](Store::compare_and_set).
///
/// Futures are `Send` so handles can be moved into spawned tasks.
pub trait Store: Clone + Send + Sync + 'static {
    /// Reads the value at `path`. `None` if nothing is stored there.
    fn get(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Replaces the value at `path`.
    fn set(
        &self,
        path: &Path,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Merges `fields` into the object at `path`, one child key at a time.
    /// Keys not named in `fields` are left untouched.
    fn update(
        &self,
        path: &Path,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the value at `path` and everything beneath it.
    fn remove(&self, path: &Path) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically writes `new` at `path` only if the current value equals
    /// `expected` (`None` meaning "absent"). Returns whether it wrote.
    fn compare_and_set(
        &self,
        path: &Path,
        expected: Option<Value>,
        new: Value,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Starts observing `path`. The first snapshot is the current value;
    /// another follows every write that can change it.
    fn subscribe(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Subscription, StoreError>> + Send;
}
