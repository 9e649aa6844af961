//! Room directory: lists, filters and deletes rooms.
//!
//! The directory is a read-only snapshot for display, not authoritative
//! for gameplay. Deleting rooms is an operator action.

use std::cmp::Reverse;

use roomsync_protocol::{
    Codec, GameKind, JsonCodec, RoomId, RoomSummary, USERS_KEY,
};
use roomsync_store::Store;
use serde_json::Value;

use crate::{RoomConfig, RoomError};

/// One row of the room listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub room_id: RoomId,
    pub summary: RoomSummary,
    /// Participants with any record in the room, regardless of round.
    pub participant_count: usize,
}

/// Reads and prunes the set of rooms under [`RoomConfig::root`].
#[derive(Debug, Clone)]
pub struct RoomDirectory<S: Store> {
    store: S,
    config: RoomConfig,
    codec: JsonCodec,
}

impl<S: Store> RoomDirectory<S> {
    pub fn new(store: S, config: RoomConfig) -> Self {
        Self {
            store,
            config,
            codec: JsonCodec,
        }
    }

    /// All rooms, most recently updated first. Rooms that were never
    /// stamped come last. Entries that fail to decode are skipped.
    pub async fn list(&self) -> Result<Vec<DirectoryEntry>, RoomError> {
        let Some(Value::Object(rooms)) =
            self.store.get(&self.config.directory_path()).await?
        else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<DirectoryEntry> = rooms
            .into_iter()
            .filter_map(|(id, value)| {
                let participant_count = value
                    .get(USERS_KEY)
                    .and_then(Value::as_object)
                    .map_or(0, |users| users.len());
                match self.codec.decode::<RoomSummary>(value) {
                    Ok(summary) => Some(DirectoryEntry {
                        room_id: RoomId::new(id),
                        summary,
                        participant_count,
                    }),
                    Err(e) => {
                        tracing::warn!(room_id = %id, error = %e, "skipping undecodable room");
                        None
                    }
                }
            })
            .collect();

        // `None` sorts below every `Some`, so reversing puts it last.
        entries.sort_by_key(|entry| Reverse(entry.summary.last_updated));
        Ok(entries)
    }

    /// Rooms owned by `game`, most recently updated first.
    pub async fn list_game(&self, game: GameKind) -> Result<Vec<DirectoryEntry>, RoomError> {
        let mut entries = self.list().await?;
        entries.retain(|entry| entry.summary.game_id == Some(game));
        Ok(entries)
    }

    /// Deletes one room and all its participants.
    pub async fn delete(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.store.remove(&self.config.room_path(room_id)).await?;
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    /// Deletes every room.
    pub async fn clear(&self) -> Result<(), RoomError> {
        self.store.remove(&self.config.directory_path()).await?;
        tracing::info!(root = %self.config.root, "all rooms cleared");
        Ok(())
    }
}
