//! Push subscriptions as an explicit stream of snapshots.

use futures_util::Stream;
use roomsync_protocol::Path;
use serde_json::Value;
use tokio::sync::mpsc;

/// The value at a subscribed path after some write.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: Path,
    /// `None` when nothing is stored at the path.
    pub value: Option<Value>,
}

/// A live observation of one path.
///
/// Dropping the subscription stops it; the store notices the closed
/// channel and forgets the watcher on its next write.
#[derive(Debug)]
pub struct Subscription {
    path: Path,
    receiver: mpsc::UnboundedReceiver<Option<Value>>,
}

impl Subscription {
    /// Wraps the receiving end of a store's notification channel.
    pub fn new(path: Path, receiver: mpsc::UnboundedReceiver<Option<Value>>) -> Self {
        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the next snapshot. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        let value = self.receiver.recv().await?;
        Some(Snapshot {
            path: self.path.clone(),
            value,
        })
    }

    /// Takes the next snapshot if one is already buffered, without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        let value = self.receiver.try_recv().ok()?;
        Some(Snapshot {
            path: self.path.clone(),
            value,
        })
    }

    /// Adapts the subscription into a [`Stream`] of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            let snapshot = sub.next().await?;
            Some((snapshot, sub))
        })
    }
}
