//! Mutation intents produced by game rules.

use std::fmt;
use std::time::Duration;

use roomsync_protocol::RoundTag;

use crate::GameRules;

/// A write the session should perform on behalf of the acting participant.
///
/// Games never touch the store directly; they describe what should change
/// and the session applies intents in the order they are returned.
pub enum Intent<G: GameRules> {
    /// Merge fields into the room's shared state.
    UpdateShared(Vec<G::SharedField>),

    /// Merge fields into the actor's own participant record.
    UpdateParticipant(Vec<G::ParticipantField>),

    /// Replace the actor's own participant record.
    SetParticipant { round: RoundTag, data: G::Participant },

    /// Try to become the room's host. `then` is written to the shared
    /// state only if this participant wins the election.
    ClaimHost { then: Vec<G::SharedField> },

    /// Merge fields into the shared state after a delay, from a
    /// background task. Skipped if the session has left the room by then.
    Deferred {
        after: Duration,
        fields: Vec<G::SharedField>,
    },
}

impl<G: GameRules> Clone for Intent<G> {
    fn clone(&self) -> Self {
        match self {
            Self::UpdateShared(fields) => Self::UpdateShared(fields.clone()),
            Self::UpdateParticipant(fields) => Self::UpdateParticipant(fields.clone()),
            Self::SetParticipant { round, data } => Self::SetParticipant {
                round: *round,
                data: data.clone(),
            },
            Self::ClaimHost { then } => Self::ClaimHost { then: then.clone() },
            Self::Deferred { after, fields } => Self::Deferred {
                after: *after,
                fields: fields.clone(),
            },
        }
    }
}

impl<G: GameRules> fmt::Debug for Intent<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateShared(fields) => f.debug_tuple("UpdateShared").field(fields).finish(),
            Self::UpdateParticipant(fields) => {
                f.debug_tuple("UpdateParticipant").field(fields).finish()
            }
            Self::SetParticipant { round, data } => f
                .debug_struct("SetParticipant")
                .field("round", round)
                .field("data", data)
                .finish(),
            Self::ClaimHost { then } => f.debug_struct("ClaimHost").field("then", then).finish(),
            Self::Deferred { after, fields } => f
                .debug_struct("Deferred")
                .field("after", after)
                .field("fields", fields)
                .finish(),
        }
    }
}
