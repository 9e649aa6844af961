//! The `GameRules` trait: the extension point for each game.
//!
//! A game is a set of pure functions over a [`RoomView`]: it declares the
//! shape of its shared and per-participant fields, what a freshly
//! bootstrapped room looks like, and how an action turns into mutation
//! [`Intent`]s. The [`RoomSession`](crate::RoomSession) does all the I/O.

use std::fmt::Debug;

use rand::Rng;
use roomsync_protocol::GameKind;
use roomsync_session::Identity;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Intent, RoomView};

/// The trait every game implements.
///
/// Associated types:
/// - `Config`: game-specific settings (reveal delay, etc.)
/// - `Shared`: the game's own fields in the room record
/// - `Participant`: the game's own fields in each participant record
/// - `SharedField` / `ParticipantField`: one enum variant per field the
///   game may write, serialized as a single-key object (see
///   [`Patch`](roomsync_protocol::Patch))
/// - `Action`: what a participant can do
///
/// None of these methods perform I/O.
pub trait GameRules: Send + Sync + Sized + 'static {
    /// The `gameId` stamped on rooms this game bootstraps.
    const GAME: GameKind;

    /// Game-specific configuration.
    type Config: Send + Sync + Clone + Default + 'static;

    /// Shared fields, flattened into the room record.
    type Shared: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Debug
        + Send
        + Sync
        + 'static;

    /// Per-participant fields, flattened into each participant record.
    type Participant: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Debug
        + Send
        + Sync
        + 'static;

    /// A single writable shared field.
    type SharedField: Serialize + Clone + Debug + PartialEq + Send + Sync + 'static;

    /// A single writable per-participant field.
    type ParticipantField: Serialize + Clone + Debug + PartialEq + Send + Sync + 'static;

    /// What a participant can do in this game.
    type Action: Debug + Send;

    /// Shared fields written when a participant bootstraps the room.
    ///
    /// `gameId`, `round = 1` and `lastUpdated` are written alongside by the
    /// session.
    fn initial_shared(config: &Self::Config) -> Vec<Self::SharedField>;

    /// Checks an action before it is handled.
    ///
    /// If this returns `Err`, nothing is written and the reason is
    /// returned to the caller. Default: accept all.
    fn validate_action(
        _config: &Self::Config,
        _view: &RoomView<Self>,
        _actor: &Identity,
        _action: &Self::Action,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Turns an action into the writes it implies, in order.
    ///
    /// `view` is the last snapshot the actor saw. An action that has no
    /// effect returns an empty list.
    fn handle_action<R: Rng + ?Sized>(
        config: &Self::Config,
        view: &RoomView<Self>,
        actor: &Identity,
        action: Self::Action,
        rng: &mut R,
    ) -> Vec<Intent<Self>>;
}
