//! Local participant identity for Roomsync.
//!
//! This crate handles who "we" are in every room:
//!
//! 1. **Identity**: a random opaque participant id plus the current
//!    display nickname ([`Identity`])
//! 2. **Nickname editing**: a draft that is confirmed or cancelled
//!    ([`NicknameEditor`])
//! 3. **Id generation**: random room and participant ids
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← stamps the nickname on every participant write
//!     ↕
//! Session Layer (this crate)  ← owns the local participant's identity
//!     ↕
//! Protocol Layer (below)  ← provides ParticipantId, RoomId
//! ```
//!
//! Identity lives for the lifetime of the process; nothing here persists it.

mod error;
mod identity;
mod nickname;

pub use error::SessionError;
pub use identity::{
    Identity, PARTICIPANT_ID_LEN, ROOM_ID_LEN, generate_participant_id, generate_room_id,
};
pub use nickname::{MAX_NICKNAME_CHARS, NicknameEditor};
