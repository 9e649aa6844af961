//! Unified error type for Roomsync.

use roomsync_protocol::ProtocolError;
use roomsync_room::RoomError;
use roomsync_session::SessionError;
use roomsync_store::StoreError;

/// Any error from the Roomsync crates.
///
/// `?` converts each crate's error into this one.
#[derive(Debug, thiserror::Error)]
pub enum RoomsyncError {
    /// Encoding or decoding a room record failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store was unreachable or refused an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A nickname edit was rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed or a game rejected an action.
    #[error(transparent)]
    Room(#[from] RoomError),
}
