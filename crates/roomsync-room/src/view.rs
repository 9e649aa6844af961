//! Read-only snapshot of a room as a game sees it.

use std::fmt;

use roomsync_protocol::{ParticipantId, ParticipantRecord, RoomId, RoomRecord, Round};

use crate::{GameRules, RoomPhase};

/// Typed room record for game `G`.
pub type GameRecord<G> =
    RoomRecord<<G as GameRules>::Shared, <G as GameRules>::Participant>;

/// Typed participant record for game `G`.
pub type GameParticipant<G> = ParticipantRecord<<G as GameRules>::Participant>;

/// The last-seen state of one room.
///
/// Games read it; only the session replaces it.
pub struct RoomView<G: GameRules> {
    room_id: RoomId,
    record: GameRecord<G>,
}

impl<G: GameRules> RoomView<G> {
    pub fn new(room_id: RoomId, record: GameRecord<G>) -> Self {
        Self { room_id, record }
    }

    /// A room with nothing stored yet.
    pub fn empty(room_id: RoomId) -> Self {
        Self::new(room_id, RoomRecord::default())
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn record(&self) -> &GameRecord<G> {
        &self.record
    }

    /// The game's own shared fields.
    pub fn shared(&self) -> &G::Shared {
        &self.record.shared
    }

    pub fn round(&self) -> Round {
        self.record.current_round()
    }

    pub fn phase(&self) -> RoomPhase {
        if self.record.is_initialized() {
            RoomPhase::Active
        } else {
            RoomPhase::Uninitialized
        }
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&GameParticipant<G>> {
        self.record.participant(id)
    }

    /// The participant's record only if it is tagged with the current round.
    pub fn current_participant(&self, id: &ParticipantId) -> Option<&GameParticipant<G>> {
        self.participant(id)
            .filter(|record| record.round.is_round(self.round()))
    }

    /// Participants whose contribution counts in the current round.
    pub fn current_participants(
        &self,
    ) -> impl Iterator<Item = (&ParticipantId, &GameParticipant<G>)> {
        self.record.current_participants()
    }

    /// Number of participants tagged with the current round.
    pub fn ready_count(&self) -> usize {
        self.current_participants().count()
    }
}

impl<G: GameRules> Clone for RoomView<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id.clone(),
            record: self.record.clone(),
        }
    }
}

impl<G: GameRules> fmt::Debug for RoomView<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomView")
            .field("room_id", &self.room_id)
            .field("record", &self.record)
            .finish()
    }
}
