//! Data shapes for Roomsync.
//!
//! This crate defines everything that is written to, or read back from,
//! the external key-path store:
//!
//! - **Types** ([`RoomId`], [`ParticipantId`], [`Round`], [`RoundTag`],
//!   [`Path`], etc.): identities and the key hierarchy.
//! - **Records** ([`RoomRecord`], [`ParticipantRecord`], [`RoomSummary`]):
//!   the shared room state and the per-participant state, generic over
//!   each game's own fields.
//! - **Patches** ([`Patch`]): typed field writes merged into a record.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records are
//!   converted to/from the store's JSON value tree.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between the store (untyped JSON tree) and the
//! room layer (typed game state). It does no I/O.
//!
//! ```text
//! Store (serde_json::Value) → Protocol (RoomRecord<S, P>) → Room (RoomView<G>)
//! ```

mod codec;
mod error;
mod patch;
mod record;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use patch::Patch;
pub use record::{ParticipantRecord, RoomRecord, RoomSummary};
pub use types::{
    GameKind, ParticipantId, Path, RoomId, Round, RoundTag, Stamp, Timestamp,
    USERS_KEY,
};
