//! In-process [`Store`] implementation.
//!
//! Mirrors the hosted database's observable behavior closely enough to
//! run the whole synchronization contract without a network:
//!
//! - `null` values and empty objects are deletions.
//! - The server-time placeholder is resolved from a clock that never
//!   repeats or goes backwards.
//! - Every write notifies watchers of overlapping paths, in write order.
//! - `compare_and_set` runs under the store lock, so it is atomic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use roomsync_protocol::{Path, Stamp};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc};

use crate::{Store, StoreError, Subscription};

/// Counter for generating watcher IDs (used in logs only).
static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// A [`Store`] that keeps the whole tree in memory.
///
/// Cheap to clone; every clone shares the same tree, like several
/// clients connected to the same database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    watchers: Vec<Watcher>,
    last_time: u64,
    offline: bool,
}

struct Watcher {
    id: u64,
    path: Path,
    sender: mpsc::UnboundedSender<Option<Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with
    /// [`StoreError::Unavailable`] until switched back on.
    pub async fn set_offline(&self, offline: bool) {
        self.inner.lock().await.offline = offline;
        tracing::info!(offline, "memory store availability changed");
    }

    /// Number of subscriptions that are still being listened to.
    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.watchers.retain(|w| !w.sender.is_closed());
        inner.watchers.len()
    }
}

impl Inner {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    /// Next server time in milliseconds. Strictly increasing.
    fn now(&mut self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.last_time = wall.max(self.last_time.saturating_add(1));
        self.last_time
    }

    /// Resolves placeholders and strips deletions from a value about to
    /// be written. `None` means "delete".
    fn prepare(&mut self, mut value: Value) -> Option<Value> {
        let now = self.now();
        resolve_server_values(&mut value, now);
        normalize(value)
    }

    /// Pushes the new value to every watcher whose path overlaps `written`,
    /// dropping watchers whose subscription has gone away.
    fn notify(&mut self, written: &Path) {
        let root = &self.root;
        self.watchers.retain(|watcher| {
            if !watcher.path.overlaps(written) {
                return !watcher.sender.is_closed();
            }
            let delivered = watcher.sender.send(read(root, &watcher.path)).is_ok();
            if !delivered {
                tracing::debug!(watcher = watcher.id, path = %watcher.path, "watcher dropped");
            }
            delivered
        });
    }
}

impl Store for MemoryStore {
    async fn get(&self, path: &Path) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_online()?;
        Ok(read(&inner.root, path))
    }

    async fn set(&self, path: &Path, value: Value) -> Result<(), StoreError> {
        reject_root(path, "set")?;
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        let value = inner.prepare(value);
        write(&mut inner.root, path, value);
        inner.notify(path);
        tracing::trace!(%path, "set");
        Ok(())
    }

    async fn update(&self, path: &Path, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        for (key, value) in fields {
            let value = inner.prepare(value);
            write(&mut inner.root, &path.child(key), value);
        }
        inner.notify(path);
        tracing::trace!(%path, "update");
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<(), StoreError> {
        reject_root(path, "remove")?;
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        write(&mut inner.root, path, None);
        inner.notify(path);
        tracing::trace!(%path, "remove");
        Ok(())
    }

    async fn compare_and_set(
        &self,
        path: &Path,
        expected: Option<Value>,
        new: Value,
    ) -> Result<bool, StoreError> {
        reject_root(path, "compare_and_set")?;
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        if read(&inner.root, path) != expected {
            tracing::trace!(%path, "compare_and_set precondition failed");
            return Ok(false);
        }
        let value = inner.prepare(new);
        write(&mut inner.root, path, value);
        inner.notify(path);
        tracing::trace!(%path, "compare_and_set wrote");
        Ok(true)
    }

    async fn subscribe(&self, path: &Path) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive, so this initial delivery cannot fail.
        let _ = sender.send(read(&inner.root, path));
        let id = NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed);
        inner.watchers.push(Watcher {
            id,
            path: path.clone(),
            sender,
        });
        tracing::debug!(%path, watcher = id, "subscribed");
        Ok(Subscription::new(path.clone(), receiver))
    }
}

fn reject_root(path: &Path, op: &str) -> Result<(), StoreError> {
    if path.is_root() {
        return Err(StoreError::InvalidPath(format!("{op} at the root is not allowed")));
    }
    Ok(())
}

/// Clones the value at `path`, if any.
fn read(root: &Map<String, Value>, path: &Path) -> Option<Value> {
    let Some((first, rest)) = path.segments().split_first() else {
        if root.is_empty() {
            return None;
        }
        return Some(Value::Object(root.clone()));
    };
    let mut node = root.get(first)?;
    for segment in rest {
        node = node.as_object()?.get(segment)?;
    }
    Some(node.clone())
}

/// Writes (or with `None`, deletes) the value at `path`, creating parent
/// objects on the way down and pruning parents left empty on the way up.
fn write(root: &mut Map<String, Value>, path: &Path, value: Option<Value>) {
    write_into(root, path.segments(), value);
}

fn write_into(map: &mut Map<String, Value>, segments: &[String], value: Option<Value>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert(first.clone(), v);
            }
            None => {
                map.remove(first);
            }
        }
        return;
    }
    if value.is_none() && !map.get(first).is_some_and(Value::is_object) {
        return;
    }
    let child = map
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        // A leaf in the way of a deeper write is replaced, as the hosted store does.
        *child = Value::Object(Map::new());
    }
    let now_empty = match child {
        Value::Object(child_map) => {
            write_into(child_map, rest, value);
            child_map.is_empty()
        }
        _ => false,
    };
    if now_empty {
        map.remove(first);
    }
}

fn resolve_server_values(value: &mut Value, now: u64) {
    if Stamp::is_server_value(value) {
        *value = Value::from(now);
        return;
    }
    match value {
        Value::Object(map) => map
            .values_mut()
            .for_each(|v| resolve_server_values(v, now)),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|v| resolve_server_values(v, now)),
        _ => {}
    }
}

/// Drops `null`s and empty objects; they mean "nothing stored here".
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if map.is_empty() {
                None
            } else {
                Some(Value::Object(map))
            }
        }
        other => Some(other),
    }
}
