//! Core identity, epoch, time, and key-path types.
//!
//! Everything here is a small value type that is written to the store
//! verbatim, so the serde representations matter: ids are bare strings,
//! rounds are bare integers, and the server-time placeholder uses the
//! store's `{".sv": "timestamp"}` convention.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Key under a room that holds the participant mapping.
pub const USERS_KEY: &str = "users";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of a room (a short random alphanumeric string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an existing room id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased label used when showing the room to people.
    pub fn label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a participant, distinct from its display nickname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps an existing participant id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which rule-set owns a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Dice,
    Roulette,
    #[serde(rename = "kingjoker")]
    KingJoker,
    /// A room written by a game this build doesn't know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dice => write!(f, "dice"),
            Self::Roulette => write!(f, "roulette"),
            Self::KingJoker => write!(f, "kingjoker"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// An epoch within a room. Never decreases during the room's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Round(pub u32);

impl Round {
    /// The round every freshly bootstrapped room starts in.
    pub const FIRST: Round = Round(1);

    /// The round after this one.
    pub fn next(self) -> Self {
        Round(self.0.saturating_add(1))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The round a participant last acted in.
///
/// Stored as a plain integer: `-1` means "present but has not played this
/// round", any non-negative value is a round number. Other negative
/// values are rejected on decode instead of being mistaken for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundTag {
    #[default]
    Joined,
    Played(Round),
}

impl RoundTag {
    /// Stored value of [`RoundTag::Joined`].
    pub const JOINED_SENTINEL: i64 = -1;

    /// Returns `true` if this participant's contribution counts in `round`.
    pub fn is_round(self, round: Round) -> bool {
        self == RoundTag::Played(round)
    }

    /// The round, if the participant has played one.
    pub fn round(self) -> Option<Round> {
        match self {
            Self::Joined => None,
            Self::Played(r) => Some(r),
        }
    }
}

impl From<RoundTag> for i64 {
    fn from(tag: RoundTag) -> Self {
        match tag {
            RoundTag::Joined => RoundTag::JOINED_SENTINEL,
            RoundTag::Played(Round(n)) => i64::from(n),
        }
    }
}

impl TryFrom<i64> for RoundTag {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw == Self::JOINED_SENTINEL {
            return Ok(Self::Joined);
        }
        u32::try_from(raw)
            .map(|n| Self::Played(Round(n)))
            .map_err(|_| format!("round tag {raw} is neither -1 nor a valid round"))
    }
}

impl Serialize for RoundTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(i64::from(*self))
    }
}

impl<'de> Deserialize<'de> for RoundTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        RoundTag::try_from(raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Milliseconds since the Unix epoch, as assigned by the store's clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

/// A timestamp field that is either already resolved, or a placeholder
/// asking the store to fill in its own clock at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    Server,
    At(Timestamp),
}

impl Stamp {
    /// Key of the server-value placeholder object.
    pub const SENTINEL_KEY: &'static str = ".sv";
    /// Value of the server-value placeholder object.
    pub const SENTINEL_VALUE: &'static str = "timestamp";

    /// The placeholder as a raw JSON value, for untyped writes.
    pub fn server_value() -> Value {
        let mut map = serde_json::Map::new();
        map.insert(
            Self::SENTINEL_KEY.to_string(),
            Value::String(Self::SENTINEL_VALUE.to_string()),
        );
        Value::Object(map)
    }

    /// Returns `true` if `value` is the server-time placeholder.
    pub fn is_server_value(value: &Value) -> bool {
        match value {
            Value::Object(map) => {
                map.len() == 1
                    && map.get(Self::SENTINEL_KEY).and_then(Value::as_str)
                        == Some(Self::SENTINEL_VALUE)
            }
            _ => false,
        }
    }

    /// The resolved time, if the store has filled it in.
    pub fn timestamp(self) -> Option<Timestamp> {
        match self {
            Self::Server => None,
            Self::At(t) => Some(t),
        }
    }
}

impl Serialize for Stamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Server => Self::server_value().serialize(serializer),
            Self::At(t) => serializer.serialize_u64(t.0),
        }
    }
}

impl<'de> Deserialize<'de> for Stamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(ms) = value.as_u64() {
            return Ok(Self::At(Timestamp(ms)));
        }
        if Self::is_server_value(&value) {
            return Ok(Self::Server);
        }
        Err(serde::de::Error::custom(format!(
            "expected a timestamp or server placeholder, got {value}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Key paths
// ---------------------------------------------------------------------------

/// A location in the store's key hierarchy, e.g. `room/abc12/users/k3x9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root of the hierarchy.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a `/`-separated path. Empty segments are ignored.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// `{root}/{room_id}`: the room's shared state.
    pub fn room(root: &str, room_id: &RoomId) -> Self {
        Self::parse(root).child(room_id.as_str())
    }

    /// `{root}/{room_id}/users/{participant}`: one participant's state.
    pub fn participant(root: &str, room_id: &RoomId, participant: &ParticipantId) -> Self {
        Self::room(root, room_id)
            .child(USERS_KEY)
            .child(participant.as_str())
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The parent path, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// The final segment, or `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Returns `true` if a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tag_sentinel_round_trips_as_minus_one() {
        let json = serde_json::to_value(RoundTag::Joined).unwrap();
        assert_eq!(json, serde_json::json!(-1));
        let back: RoundTag = serde_json::from_value(json).unwrap();
        assert_eq!(back, RoundTag::Joined);
    }

    #[test]
    fn test_round_tag_rejects_other_negative_values() {
        let result: Result<RoundTag, _> = serde_json::from_value(serde_json::json!(-7));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_tag_is_round() {
        assert!(RoundTag::Played(Round(2)).is_round(Round(2)));
        assert!(!RoundTag::Played(Round(1)).is_round(Round(2)));
        assert!(!RoundTag::Joined.is_round(Round(0)));
    }

    #[test]
    fn test_round_next_is_monotonic() {
        assert_eq!(Round::FIRST.next(), Round(2));
        assert_eq!(Round(u32::MAX).next(), Round(u32::MAX));
    }

    #[test]
    fn test_stamp_server_serializes_to_placeholder() {
        let json = serde_json::to_value(Stamp::Server).unwrap();
        assert!(Stamp::is_server_value(&json));
        assert_eq!(json, serde_json::json!({ ".sv": "timestamp" }));
    }

    #[test]
    fn test_stamp_decodes_resolved_millis() {
        let stamp: Stamp = serde_json::from_value(serde_json::json!(1700)).unwrap();
        assert_eq!(stamp, Stamp::At(Timestamp(1700)));
        assert_eq!(stamp.timestamp(), Some(Timestamp(1700)));
    }

    #[test]
    fn test_game_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(GameKind::KingJoker).unwrap(),
            serde_json::json!("kingjoker")
        );
        let unknown: GameKind = serde_json::from_value(serde_json::json!("poker")).unwrap();
        assert_eq!(unknown, GameKind::Unknown);
    }

    #[test]
    fn test_path_layout() {
        let room = RoomId::new("ab12c");
        let who = ParticipantId::new("k3x9");
        assert_eq!(Path::room("room", &room).to_string(), "room/ab12c");
        assert_eq!(
            Path::participant("room", &room, &who).to_string(),
            "room/ab12c/users/k3x9"
        );
    }

    #[test]
    fn test_path_contains_and_overlaps() {
        let room = Path::parse("room/ab12c");
        let user = Path::parse("room/ab12c/users/k3x9");
        let other = Path::parse("room/zz999");
        assert!(room.contains(&user));
        assert!(!user.contains(&room));
        assert!(user.overlaps(&room));
        assert!(!room.overlaps(&other));
        assert!(Path::root().contains(&other));
    }

    #[test]
    fn test_path_parent_and_last() {
        let p = Path::parse("/room//ab12c/");
        assert_eq!(p.segments().len(), 2);
        assert_eq!(p.last(), Some("ab12c"));
        assert_eq!(p.parent(), Some(Path::parse("room")));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_room_label_is_upper_case() {
        assert_eq!(RoomId::new("ab12c").label(), "AB12C");
    }
}
