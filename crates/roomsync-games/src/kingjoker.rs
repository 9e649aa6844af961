//! King/Joker: a two-seat bluffing game.
//!
//! Two participants sit as King and Joker; everyone else watches. Each
//! seat holds four normal cards and one special card (`K` for the King,
//! `J` for the Joker) and reveals them one at a time. The round is over as
//! soon as both seats have revealed up to some turn and a special card
//! shows among those turns. A new round swaps the seats.
//!
//! A hand belongs to one round: a participant whose record is tagged with
//! an older round starts the current round with a fresh hand.

use std::fmt;

use rand::Rng;
use roomsync_protocol::{GameKind, ParticipantId, Round, RoundTag};
use roomsync_room::{GameRules, Intent, RoomView};
use roomsync_session::Identity;
use serde::{Deserialize, Serialize};

/// Normal cards in each hand.
pub const NORMAL_CARDS: usize = 4;

// ---------------------------------------------------------------------------
// Cards and seats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    #[serde(rename = "N")]
    Normal,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "J")]
    Joker,
}

impl Card {
    pub fn is_special(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "N"),
            Self::King => write!(f, "K"),
            Self::Joker => write!(f, "J"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    King,
    Joker,
    Spectator,
}

impl Role {
    /// The special card this seat holds.
    pub fn special_card(self) -> Option<Card> {
        match self {
            Self::King => Some(Card::King),
            Self::Joker => Some(Card::Joker),
            Self::Spectator => None,
        }
    }
}

/// Returns `true` once both seats have revealed up to a turn and a
/// special card is among the revealed turns of either seat.
pub fn round_ended(king: &[Card], joker: &[Card]) -> bool {
    let revealed = king.len().min(joker.len());
    [king, joker]
        .iter()
        .any(|cards| cards.iter().take(revealed).any(|card| card.is_special()))
}

/// What `own` can see of the opponent's cards: one face-up card per card
/// `own` has revealed, the rest face down (`None`). Everything shows once
/// the round is over.
pub fn visible_cards(own: &[Card], opponent: &[Card], round_over: bool) -> Vec<Option<Card>> {
    opponent
        .iter()
        .enumerate()
        .map(|(turn, card)| (round_over || turn < own.len()).then_some(*card))
        .collect()
}

// ---------------------------------------------------------------------------
// Room data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KingJokerStatus {
    Open,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KingJokerShared {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<KingJokerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub king_user: Option<ParticipantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joker_user: Option<ParticipantId>,
}

/// A seat's cards for one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hand {
    pub special_played: bool,
    pub cards_played: Vec<Card>,
}

impl Hand {
    pub fn normals_played(&self) -> usize {
        self.cards_played
            .iter()
            .filter(|card| !card.is_special())
            .count()
    }

    /// Checks whether another card of this kind may be played.
    pub fn can_play(&self, special: bool) -> Result<(), String> {
        if special && self.special_played {
            return Err("special card already played".into());
        }
        if !special && self.normals_played() >= NORMAL_CARDS {
            return Err(format!("all {NORMAL_CARDS} normal cards already played"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KingJokerField {
    Status(KingJokerStatus),
    Round(Round),
    KingUser(ParticipantId),
    JokerUser(ParticipantId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandField {
    SpecialPlayed(bool),
    CardsPlayed(Vec<Card>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KingJokerAction {
    /// Take the King seat if free, else the Joker seat.
    Join,
    /// Take a seat even if someone holds it.
    ForceJoin { as_king: bool },
    /// Start the next round with the seats swapped.
    StartNew,
    /// Reveal a normal card or the special card.
    Play { special: bool },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KingJokerConfig;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The King/Joker game.
pub struct KingJoker;

impl GameRules for KingJoker {
    const GAME: GameKind = GameKind::KingJoker;

    type Config = KingJokerConfig;
    type Shared = KingJokerShared;
    type Participant = Hand;
    type SharedField = KingJokerField;
    type ParticipantField = HandField;
    type Action = KingJokerAction;

    fn initial_shared(_config: &KingJokerConfig) -> Vec<KingJokerField> {
        vec![KingJokerField::Status(KingJokerStatus::Open)]
    }

    fn validate_action(
        _config: &KingJokerConfig,
        view: &RoomView<Self>,
        actor: &Identity,
        action: &KingJokerAction,
    ) -> Result<(), String> {
        let shared = view.shared();
        let role = role_of(view, actor.participant_id());
        match action {
            KingJokerAction::Join => {
                if role != Role::Spectator {
                    return Err("already seated".into());
                }
                if shared.king_user.is_some() && shared.joker_user.is_some() {
                    return Err("both seats are taken".into());
                }
                Ok(())
            }
            KingJokerAction::ForceJoin { as_king } => {
                let target = if *as_king { Role::King } else { Role::Joker };
                if role == target {
                    return Err("already in that seat".into());
                }
                Ok(())
            }
            KingJokerAction::StartNew => {
                if shared.king_user.is_none() || shared.joker_user.is_none() {
                    return Err("need both a king and a joker".into());
                }
                Ok(())
            }
            KingJokerAction::Play { special } => {
                if role == Role::Spectator {
                    return Err("spectators cannot play".into());
                }
                if shared.king_user.is_none() || shared.joker_user.is_none() {
                    return Err("waiting for an opponent".into());
                }
                let (king, joker) = seated_hands(view);
                if round_ended(&king.cards_played, &joker.cards_played) {
                    return Err("round is over".into());
                }
                hand_of(view, actor.participant_id()).can_play(*special)
            }
        }
    }

    fn handle_action<R: Rng + ?Sized>(
        _config: &KingJokerConfig,
        view: &RoomView<Self>,
        actor: &Identity,
        action: KingJokerAction,
        _rng: &mut R,
    ) -> Vec<Intent<Self>> {
        let me = actor.participant_id().clone();
        let shared = view.shared();
        match action {
            KingJokerAction::Join => {
                let seat = if shared.king_user.is_none() {
                    KingJokerField::KingUser(me)
                } else {
                    KingJokerField::JokerUser(me)
                };
                vec![Intent::UpdateShared(vec![seat])]
            }
            KingJokerAction::ForceJoin { as_king } => {
                let seat = if as_king {
                    KingJokerField::KingUser(me)
                } else {
                    KingJokerField::JokerUser(me)
                };
                vec![Intent::UpdateShared(vec![seat])]
            }
            KingJokerAction::StartNew => {
                let (Some(king), Some(joker)) = (&shared.king_user, &shared.joker_user) else {
                    return Vec::new();
                };
                vec![Intent::UpdateShared(vec![
                    KingJokerField::KingUser(joker.clone()),
                    KingJokerField::JokerUser(king.clone()),
                    KingJokerField::Round(view.round().next()),
                ])]
            }
            KingJokerAction::Play { special } => {
                let role = role_of(view, &me);
                let card = if special {
                    role.special_card()
                } else {
                    Some(Card::Normal)
                };
                let Some(card) = card else {
                    return Vec::new();
                };
                let mut hand = hand_of(view, &me);
                hand.cards_played.push(card);
                hand.special_played |= special;
                vec![Intent::SetParticipant {
                    round: RoundTag::Played(view.round()),
                    data: hand,
                }]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Which seat `id` holds.
pub fn role_of(view: &RoomView<KingJoker>, id: &ParticipantId) -> Role {
    let shared = view.shared();
    if shared.king_user.as_ref() == Some(id) {
        Role::King
    } else if shared.joker_user.as_ref() == Some(id) {
        Role::Joker
    } else {
        Role::Spectator
    }
}

/// The participant's hand for the current round; empty if it has not
/// played this round.
pub fn hand_of(view: &RoomView<KingJoker>, id: &ParticipantId) -> Hand {
    view.current_participant(id)
        .map(|record| record.data.clone())
        .unwrap_or_default()
}

/// The King's and Joker's current hands.
pub fn seated_hands(view: &RoomView<KingJoker>) -> (Hand, Hand) {
    let seat = |id: &Option<ParticipantId>| {
        id.as_ref()
            .map(|id| hand_of(view, id))
            .unwrap_or_default()
    };
    (seat(&view.shared().king_user), seat(&view.shared().joker_user))
}

/// Returns `true` once the current round has been decided.
pub fn is_round_over(view: &RoomView<KingJoker>) -> bool {
    let (king, joker) = seated_hands(view);
    round_ended(&king.cards_played, &joker.cards_played)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use roomsync_protocol::{ParticipantRecord, RoomId, RoomRecord};

    use super::Card::{Joker as J, King as K, Normal as N};

    fn seated(round: u32, king: &[Card], joker: &[Card]) -> RoomView<KingJoker> {
        let mut record: RoomRecord<KingJokerShared, Hand> = RoomRecord::default();
        record.round = Some(Round(round));
        record.shared.king_user = Some(ParticipantId::new("k"));
        record.shared.joker_user = Some(ParticipantId::new("j"));
        for (id, cards) in [("k", king), ("j", joker)] {
            record.users.insert(
                ParticipantId::new(id),
                ParticipantRecord {
                    round: RoundTag::Played(Round(round)),
                    nickname: None,
                    data: Hand {
                        special_played: cards.iter().any(|c| c.is_special()),
                        cards_played: cards.to_vec(),
                    },
                },
            );
        }
        RoomView::new(RoomId::new("kj"), record)
    }

    fn actor(id: &str) -> Identity {
        Identity::new(ParticipantId::new(id), id)
    }

    fn check(view: &RoomView<KingJoker>, who: &str, action: KingJokerAction) -> Result<(), String> {
        KingJoker::validate_action(&KingJokerConfig, view, &actor(who), &action)
    }

    fn play(
        view: &RoomView<KingJoker>,
        who: &str,
        action: KingJokerAction,
    ) -> Vec<Intent<KingJoker>> {
        let mut rng = StdRng::seed_from_u64(0);
        KingJoker::handle_action(&KingJokerConfig, view, &actor(who), action, &mut rng)
    }

    #[test]
    fn test_round_not_ended_without_special() {
        assert!(!round_ended(&[], &[]));
        assert!(!round_ended(&[N, N], &[N, N]));
    }

    #[test]
    fn test_round_ended_when_special_within_shared_turns() {
        assert!(round_ended(&[K], &[N]));
        assert!(round_ended(&[N, N], &[N, J]));
        assert!(round_ended(&[N, K, N], &[N, N]));
    }

    #[test]
    fn test_special_beyond_shared_turns_does_not_end_round() {
        assert!(!round_ended(&[N, K], &[N]));
        assert!(!round_ended(&[K], &[]));
    }

    #[test]
    fn test_visible_cards_hides_unanswered_turns() {
        assert_eq!(visible_cards(&[N], &[N, J], false), vec![Some(N), None]);
        assert_eq!(visible_cards(&[], &[N], false), vec![None]);
        assert_eq!(visible_cards(&[], &[N, J], true), vec![Some(N), Some(J)]);
    }

    #[test]
    fn test_play_limits() {
        let full = Hand {
            special_played: true,
            cards_played: vec![N, N, K, N, N],
        };
        assert!(full.can_play(false).is_err());
        assert!(full.can_play(true).is_err());

        let fresh = Hand::default();
        assert!(fresh.can_play(false).is_ok());
        assert!(fresh.can_play(true).is_ok());
    }

    #[test]
    fn test_join_fills_king_then_joker() {
        let mut record: RoomRecord<KingJokerShared, Hand> = RoomRecord::default();
        record.round = Some(Round(1));
        let empty = RoomView::new(RoomId::new("kj"), record.clone());
        let king = vec![KingJokerField::KingUser(ParticipantId::new("a"))];
        assert!(matches!(
            play(&empty, "a", KingJokerAction::Join).as_slice(),
            [Intent::UpdateShared(f)] if f == &king
        ));

        record.shared.king_user = Some(ParticipantId::new("a"));
        let half = RoomView::new(RoomId::new("kj"), record);
        let joker = vec![KingJokerField::JokerUser(ParticipantId::new("b"))];
        assert!(matches!(
            play(&half, "b", KingJokerAction::Join).as_slice(),
            [Intent::UpdateShared(f)] if f == &joker
        ));

        let full = seated(1, &[], &[]);
        assert!(check(&full, "c", KingJokerAction::Join).is_err());
        assert!(check(&full, "c", KingJokerAction::ForceJoin { as_king: true }).is_ok());
    }

    #[test]
    fn test_start_new_swaps_roles() {
        let view = seated(3, &[N, K], &[N, N]);
        match play(&view, "k", KingJokerAction::StartNew).as_slice() {
            [Intent::UpdateShared(fields)] => {
                assert!(fields.contains(&KingJokerField::KingUser(ParticipantId::new("j"))));
                assert!(fields.contains(&KingJokerField::JokerUser(ParticipantId::new("k"))));
                assert!(fields.contains(&KingJokerField::Round(Round(4))));
            }
            other => panic!("unexpected intents {other:?}"),
        }
    }

    #[test]
    fn test_play_appends_role_card() {
        let view = seated(2, &[N], &[N]);
        match play(&view, "j", KingJokerAction::Play { special: true }).as_slice() {
            [Intent::SetParticipant { round, data }] => {
                assert_eq!(*round, RoundTag::Played(Round(2)));
                assert_eq!(data.cards_played, vec![N, J]);
                assert!(data.special_played);
            }
            other => panic!("unexpected intents {other:?}"),
        }
    }

    #[test]
    fn test_stale_hand_starts_fresh() {
        let mut view_record = seated(2, &[N, N, N, N], &[N]).record().clone();
        if let Some(king) = view_record.users.get_mut(&ParticipantId::new("k")) {
            king.round = RoundTag::Played(Round(1));
        }
        let view = RoomView::new(RoomId::new("kj"), view_record);

        assert_eq!(hand_of(&view, &ParticipantId::new("k")), Hand::default());
        match play(&view, "k", KingJokerAction::Play { special: false }).as_slice() {
            [Intent::SetParticipant { data, .. }] => assert_eq!(data.cards_played, vec![N]),
            other => panic!("unexpected intents {other:?}"),
        }
    }

    #[test]
    fn test_validate_play() {
        let normal = KingJokerAction::Play { special: false };
        let special = KingJokerAction::Play { special: true };

        let over = seated(1, &[K], &[N]);
        assert!(is_round_over(&over));
        assert!(check(&over, "j", normal).is_err());

        let running = seated(1, &[N, N, N, N], &[N]);
        assert!(check(&running, "x", normal).is_err());
        assert!(check(&running, "k", normal).is_err());
        assert!(check(&running, "k", special).is_ok());
    }
}
