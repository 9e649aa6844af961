//! Room synchronization for Roomsync.
//!
//! A room is a shared record in the store that every participant
//! subscribes to and writes into. This crate holds the contract games
//! build on: joining and bootstrapping rooms, mirroring snapshots,
//! stamping writes, electing a host, and listing rooms.
//!
//! # Key types
//!
//! - [`GameRules`]: the trait each game implements
//! - [`RoomSession`]: the local participant's binding to one room
//! - [`Intent`]: a write a game asks the session to perform
//! - [`RoomView`]: the last-seen snapshot of a room
//! - [`RoomDirectory`]: lists and deletes rooms
//! - [`RoomPhase`]: whether a room has been bootstrapped
//! - [`RoomConfig`]: where rooms live in the store
//!
//! # How it fits in the stack
//!
//! ```text
//! Games (above)    ← pure rules producing Intents
//!     ↕
//! Room Layer (this crate)  ← sessions, bootstrap, host election
//!     ↕
//! Store + Session (below)  ← key-path store, local identity
//! ```

mod config;
mod directory;
mod error;
pub mod host;
mod intent;
mod logic;
mod session;
mod view;

pub use config::{RoomConfig, RoomPhase};
pub use directory::{DirectoryEntry, RoomDirectory};
pub use error::RoomError;
pub use host::HOST_KEY;
pub use intent::Intent;
pub use logic::GameRules;
pub use session::{CancelHandle, RoomSession};
pub use view::{GameParticipant, GameRecord, RoomView};
