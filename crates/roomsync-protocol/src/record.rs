//! Room and participant records as they live in the store.
//!
//! A room record is the union of the fields every game shares
//! (`gameId`, `lastUpdated`, `round`, `users`) and the game's own shared
//! fields, flattened into the same object:
//!
//! ```text
//! room/{roomId}
//!   gameId: "roulette"
//!   lastUpdated: 1718000000000
//!   round: 3
//!   status: "betting"          ← game-specific (flattened `S`)
//!   hostUsername: "k3x9"       ← game-specific
//!   users/
//!     k3x9: { round: 3, nickname: "JY", bet: {...} }   ← `P` flattened
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{GameKind, ParticipantId, Round, RoundTag, Timestamp};

/// The full state of one room, typed by the owning game's shared fields
/// `S` and per-participant fields `P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord<S, P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,

    /// `None` until the room has been bootstrapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<Round>,

    #[serde(flatten)]
    pub shared: S,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<ParticipantId, ParticipantRecord<P>>,
}

impl<S: Default, P> Default for RoomRecord<S, P> {
    fn default() -> Self {
        Self {
            game_id: None,
            last_updated: None,
            round: None,
            shared: S::default(),
            users: BTreeMap::new(),
        }
    }
}

impl<S, P> RoomRecord<S, P> {
    /// Returns `true` once a `round` has been written.
    pub fn is_initialized(&self) -> bool {
        self.round.is_some()
    }

    /// The room's current round (`Round(0)` before bootstrap).
    pub fn current_round(&self) -> Round {
        self.round.unwrap_or_default()
    }

    /// Looks up one participant. Absent means "not yet joined".
    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantRecord<P>> {
        self.users.get(id)
    }

    /// Returns `true` if the participant has a record in this room.
    pub fn has_joined(&self, id: &ParticipantId) -> bool {
        self.users.contains_key(id)
    }

    /// Participants whose contribution counts in the current round.
    pub fn current_participants(
        &self,
    ) -> impl Iterator<Item = (&ParticipantId, &ParticipantRecord<P>)> {
        let round = self.current_round();
        self.users
            .iter()
            .filter(move |(_, record)| record.round.is_round(round))
    }
}

/// One participant's own state within a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord<P> {
    #[serde(default)]
    pub round: RoundTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(flatten)]
    pub data: P,
}

impl<P: Default> ParticipantRecord<P> {
    /// A "present but has not played" record.
    pub fn placeholder(nickname: Option<String>) -> Self {
        Self {
            round: RoundTag::Joined,
            nickname,
            data: P::default(),
        }
    }
}

impl<P> ParticipantRecord<P> {
    /// The label shown for this participant.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "(anon)",
        }
    }
}

/// The game-agnostic part of a room, used by the room directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(default)]
    pub game_id: Option<GameKind>,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
    #[serde(default)]
    pub round: Option<Round>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Shared {
        status: Option<String>,
        host_username: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Hand {
        dice: Vec<u8>,
    }

    type Record = RoomRecord<Shared, Hand>;

    #[test]
    fn test_decode_full_room() {
        let tree = json!({
            "gameId": "dice",
            "lastUpdated": 42,
            "round": 2,
            "status": "running",
            "users": {
                "a": { "round": 2, "nickname": "Ann", "dice": [1, 2, 3, 4, 5] },
                "b": { "round": -1 },
            }
        });
        let record: Record = serde_json::from_value(tree).unwrap();
        assert_eq!(record.game_id, Some(GameKind::Dice));
        assert_eq!(record.last_updated, Some(Timestamp(42)));
        assert_eq!(record.current_round(), Round(2));
        assert_eq!(record.shared.status.as_deref(), Some("running"));

        let a = record.participant(&ParticipantId::new("a")).unwrap();
        assert_eq!(a.data.dice, vec![1, 2, 3, 4, 5]);
        assert_eq!(a.display_name(), "Ann");

        let b = record.participant(&ParticipantId::new("b")).unwrap();
        assert_eq!(b.round, RoundTag::Joined);
        assert_eq!(b.display_name(), "(anon)");
    }

    #[test]
    fn test_uninitialized_room_has_no_round() {
        let record: Record = serde_json::from_value(json!({ "gameId": "dice" })).unwrap();
        assert!(!record.is_initialized());
        assert_eq!(record.current_round(), Round(0));
    }

    #[test]
    fn test_current_participants_filters_by_round() {
        let tree = json!({
            "round": 3,
            "users": {
                "a": { "round": 3 },
                "b": { "round": 2 },
                "c": { "round": -1 },
            }
        });
        let record: Record = serde_json::from_value(tree).unwrap();
        let ids: Vec<_> = record
            .current_participants()
            .map(|(id, _)| id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_absent_participant_has_not_joined() {
        let record = Record::default();
        assert!(!record.has_joined(&ParticipantId::new("ghost")));
    }

    #[test]
    fn test_summary_ignores_game_fields() {
        let summary: RoomSummary = serde_json::from_value(json!({
            "gameId": "roulette",
            "status": "betting",
            "hostUsername": "a",
            "users": { "a": { "round": 1 } }
        }))
        .unwrap();
        assert_eq!(summary.game_id, Some(GameKind::Roulette));
        assert_eq!(summary.status.as_deref(), Some("betting"));
        assert_eq!(summary.last_updated, None);
    }
}
