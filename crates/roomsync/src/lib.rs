//! # Roomsync
//!
//! Shared-room state synchronisation for small multiplayer party games.
//!
//! Every participant runs the same client. A room is one record in a
//! shared key-path store: the game's shared state, a monotonic round
//! counter and one entry per participant. Each client observes the room,
//! computes what its own action should write using a game's pure rules,
//! and writes that back. No server holds authority; the only arbitration
//! is the store's compare-and-set, used to bootstrap a room and to elect
//! a roulette host.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomsync::prelude::*;
//! use roomsync::games::dice::{Dice, DiceAction};
//!
//! # async fn run() -> Result<(), RoomsyncError> {
//! roomsync::logging::init();
//!
//! let store = MemoryStore::new();
//! let session: RoomSession<Dice, _> = RoomSession::with_defaults(store, Identity::generate());
//! let _handle = session.join(RoomId::new("ab12c")).await?;
//! session.dispatch(DiceAction::StartNew).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logging;

pub use error::RoomsyncError;

pub use roomsync_games as games;
pub use roomsync_protocol as protocol;
pub use roomsync_room as room;
pub use roomsync_session as session;
pub use roomsync_store as store;

/// The types most programs need.
pub mod prelude {
    pub use crate::RoomsyncError;
    pub use roomsync_protocol::{GameKind, ParticipantId, RoomId, Round, RoundTag};
    pub use roomsync_room::{
        CancelHandle, DirectoryEntry, GameRules, Intent, RoomConfig, RoomDirectory, RoomError,
        RoomSession, RoomView,
    };
    pub use roomsync_session::{Identity, NicknameEditor};
    pub use roomsync_store::{MemoryStore, Store};
}
