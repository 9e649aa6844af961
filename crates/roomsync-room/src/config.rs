//! Room configuration and lifecycle phases.

use roomsync_protocol::{Path, RoomId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Where rooms live in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Top-level key of the room hierarchy.
    pub root: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            root: "room".to_string(),
        }
    }
}

impl RoomConfig {
    /// Path of the room directory (`{root}`).
    pub fn directory_path(&self) -> Path {
        Path::parse(&self.root)
    }

    /// Path of one room (`{root}/{roomId}`).
    pub fn room_path(&self, room_id: &RoomId) -> Path {
        Path::room(&self.root, room_id)
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Uninitialized → Active
/// ```
///
/// - **Uninitialized**: nothing (or no `round`) is stored for the room.
/// - **Active**: a participant bootstrapped the room. Rounds advance
///   within this phase; there is no terminal phase, rooms persist until
///   deleted from the directory.
///
/// Actions are only dispatched into an active room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Uninitialized,
    Active,
}

impl RoomPhase {
    /// Returns `true` once the room has been bootstrapped.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Active => write!(f, "Active"),
        }
    }
}
