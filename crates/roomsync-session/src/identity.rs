//! The local participant's identity and random id generation.
//!
//! A participant is identified by a random opaque id that never changes
//! for the life of the process, and labelled by a nickname that can be
//! edited at any time. Both are shared by every room session the process
//! opens, so a nickname change shows up on the next write in every room.

use std::sync::{Arc, RwLock};

use rand::Rng;
use roomsync_protocol::{ParticipantId, RoomId};

/// Length of a generated participant id.
pub const PARTICIPANT_ID_LEN: usize = 13;

/// Length of a generated room id.
pub const ROOM_ID_LEN: usize = 5;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Who the local participant is.
///
/// Cheap to clone; clones share the nickname.
#[derive(Debug, Clone)]
pub struct Identity {
    participant_id: ParticipantId,
    nickname: Arc<RwLock<String>>,
}

impl Identity {
    /// Creates an identity with a fresh random id and no nickname yet.
    pub fn generate() -> Self {
        let identity = Self::new(generate_participant_id(), "");
        tracing::debug!(participant = %identity.participant_id, "identity generated");
        identity
    }

    /// Creates an identity from a known id and nickname.
    pub fn new(participant_id: ParticipantId, nickname: impl Into<String>) -> Self {
        Self {
            participant_id,
            nickname: Arc::new(RwLock::new(nickname.into())),
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// The current display nickname (possibly empty).
    pub fn nickname(&self) -> String {
        self.nickname
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The nickname to stamp on writes, or `None` while it is still empty.
    pub fn stamped_nickname(&self) -> Option<String> {
        let nickname = self.nickname();
        (!nickname.is_empty()).then_some(nickname)
    }

    /// Returns `true` once a nickname has been chosen.
    pub fn has_nickname(&self) -> bool {
        !self
            .nickname
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    pub(crate) fn replace_nickname(&self, nickname: String) {
        *self
            .nickname
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = nickname;
    }
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// A random participant id of [`PARTICIPANT_ID_LEN`] base-36 characters.
pub fn generate_participant_id() -> ParticipantId {
    ParticipantId::new(random_base36(PARTICIPANT_ID_LEN))
}

/// A random room id of [`ROOM_ID_LEN`] base-36 characters.
pub fn generate_room_id() -> RoomId {
    RoomId::new(random_base36(ROOM_ID_LEN))
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_base36(s: &str) -> bool {
        s.bytes().all(|b| BASE36.contains(&b))
    }

    #[test]
    fn test_generate_room_id_shape() {
        let id = generate_room_id();
        assert_eq!(id.as_str().len(), ROOM_ID_LEN);
        assert!(is_base36(id.as_str()));
    }

    #[test]
    fn test_generate_participant_id_shape() {
        let id = generate_participant_id();
        assert_eq!(id.as_str().len(), PARTICIPANT_ID_LEN);
        assert!(is_base36(id.as_str()));
    }

    #[test]
    fn test_generated_ids_differ() {
        // 36^13 possibilities; a collision here means the generator is broken.
        assert_ne!(generate_participant_id(), generate_participant_id());
    }

    #[test]
    fn test_generated_identity_has_no_nickname() {
        let identity = Identity::generate();
        assert!(!identity.has_nickname());
        assert_eq!(identity.stamped_nickname(), None);
    }

    #[test]
    fn test_clones_share_nickname() {
        let identity = Identity::new(ParticipantId::new("a"), "Ann");
        let clone = identity.clone();
        identity.replace_nickname("Bea".into());
        assert_eq!(clone.nickname(), "Bea");
        assert_eq!(clone.stamped_nickname().as_deref(), Some("Bea"));
    }
}
