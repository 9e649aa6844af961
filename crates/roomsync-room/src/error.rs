//! Error types for the room layer.

use roomsync_protocol::{ProtocolError, RoomId};
use roomsync_store::StoreError;

/// Errors that can occur during room operations.
///
/// Acting without a joined room is not an error: those calls are
/// skipped and return `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The store rejected a read or write. Not retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A record could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The room has no `round`, e.g. it was removed after joining.
    #[error("room {0} is not initialized")]
    NotInitialized(RoomId),

    /// The game's rules rejected the action.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}
