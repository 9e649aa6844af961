//! Dice: every participant rolls five dice and the table counts faces.
//!
//! A round starts when someone starts a new game, which rolls their hand.
//! Others join by rolling for the same round. A hand with five different
//! faces (a flush) may be rerolled; anyone can open the table to end the
//! round.
//!
//! Ones can be shown as wild: when enabled, every 1 also counts toward
//! faces 2 to 6 in the table tally. This is a display choice and is never
//! stored, and it never affects the flush check.

use std::fmt;

use rand::Rng;
use roomsync_protocol::{GameKind, ParticipantId, Round, RoundTag};
use roomsync_room::{GameRules, Intent, RoomView};
use roomsync_session::Identity;
use serde::{Deserialize, Serialize};

/// Dice in one hand.
pub const HAND_SIZE: usize = 5;

/// Faces on a die.
pub const FACES: u8 = 6;

// ---------------------------------------------------------------------------
// Die
// ---------------------------------------------------------------------------

/// One die showing a face in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Die(u8);

impl Die {
    /// The face that can be counted as wild.
    pub const WILD: Die = Die(1);

    /// Returns `None` unless `face` is in `1..=6`.
    pub fn new(face: u8) -> Option<Self> {
        (1..=FACES).contains(&face).then_some(Die(face))
    }

    pub fn face(self) -> u8 {
        self.0
    }

    /// A uniformly random face.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Die(rng.random_range(1..=FACES))
    }
}

impl TryFrom<u8> for Die {
    type Error = String;

    fn try_from(face: u8) -> Result<Self, Self::Error> {
        Die::new(face).ok_or_else(|| format!("die face {face} is not in 1..=6"))
    }
}

impl From<Die> for u8 {
    fn from(die: Die) -> Self {
        die.0
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rolls a fresh hand of [`HAND_SIZE`] dice.
pub fn roll_hand<R: Rng + ?Sized>(rng: &mut R) -> Vec<Die> {
    (0..HAND_SIZE).map(|_| Die::roll(rng)).collect()
}

/// Returns `true` if a full hand shows no face twice. Ones are never
/// wild here.
pub fn is_flush(hand: &[Die]) -> bool {
    if hand.len() != HAND_SIZE {
        return false;
    }
    let mut seen = [false; FACES as usize];
    for die in hand {
        let slot = &mut seen[usize::from(die.face() - 1)];
        if *slot {
            return false;
        }
        *slot = true;
    }
    true
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Count per face, indexed by face value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally([u32; FACES as usize]);

impl Tally {
    /// Count for `face` (`0` for anything outside `1..=6`).
    pub fn count(&self, face: u8) -> u32 {
        match face {
            1..=FACES => self.0[usize::from(face - 1)],
            _ => 0,
        }
    }

    /// `(face, count)` pairs for faces 1 to 6.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        (1..=FACES).zip(self.0.iter().copied())
    }

    fn add(&mut self, face: u8) {
        self.0[usize::from(face - 1)] += 1;
    }
}

/// Counts faces across `dice`. With `wildcard`, each 1 also counts
/// toward every face from 2 to 6.
pub fn tally<I: IntoIterator<Item = Die>>(dice: I, wildcard: bool) -> Tally {
    let mut tally = Tally::default();
    for die in dice {
        tally.add(die.face());
        if wildcard && die == Die::WILD {
            for face in 2..=FACES {
                tally.add(face);
            }
        }
    }
    tally
}

/// Bonus per face: a hand whose distinct faces collapse to one face adds
/// one bonus to that face. With `wildcard`, ones are ignored first, so a
/// hand of only ones earns nothing.
pub fn bonus<'a, I: IntoIterator<Item = &'a [Die]>>(hands: I, wildcard: bool) -> Tally {
    let mut bonus = Tally::default();
    for hand in hands {
        let mut faces = hand
            .iter()
            .filter(|die| !(wildcard && **die == Die::WILD))
            .map(|die| die.face());
        if let Some(first) = faces.next() {
            if faces.all(|face| face == first) {
                bonus.add(first);
            }
        }
    }
    bonus
}

// ---------------------------------------------------------------------------
// Room data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceStatus {
    /// Between games; the table is showing.
    Open,
    /// A round is being played.
    Running,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceShared {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DiceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceHand {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dice: Vec<Die>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiceField {
    Status(DiceStatus),
    Round(Round),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiceHandField {
    Dice(Vec<Die>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceAction {
    /// End the round and show the table.
    Open,
    /// Advance the round and roll a hand for it.
    StartNew,
    /// Roll a hand for the running round.
    JoinAndRoll,
    /// Roll again; only with a flush from this round.
    Reroll,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiceConfig;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The dice game.
pub struct Dice;

impl GameRules for Dice {
    const GAME: GameKind = GameKind::Dice;

    type Config = DiceConfig;
    type Shared = DiceShared;
    type Participant = DiceHand;
    type SharedField = DiceField;
    type ParticipantField = DiceHandField;
    type Action = DiceAction;

    fn initial_shared(_config: &DiceConfig) -> Vec<DiceField> {
        vec![DiceField::Status(DiceStatus::Running)]
    }

    fn validate_action(
        _config: &DiceConfig,
        view: &RoomView<Self>,
        actor: &Identity,
        action: &DiceAction,
    ) -> Result<(), String> {
        let hand = own_hand(view, actor.participant_id());
        match action {
            DiceAction::Open | DiceAction::StartNew => Ok(()),
            DiceAction::JoinAndRoll => {
                if view.shared().status != Some(DiceStatus::Running) {
                    return Err("no game is running".into());
                }
                if hand.is_some() {
                    return Err("already rolled this round".into());
                }
                Ok(())
            }
            DiceAction::Reroll => match hand {
                Some(dice) if is_flush(dice) => Ok(()),
                _ => Err("reroll needs a flush from this round".into()),
            },
        }
    }

    fn handle_action<R: Rng + ?Sized>(
        _config: &DiceConfig,
        view: &RoomView<Self>,
        _actor: &Identity,
        action: DiceAction,
        rng: &mut R,
    ) -> Vec<Intent<Self>> {
        match action {
            DiceAction::Open => vec![Intent::UpdateShared(vec![DiceField::Status(
                DiceStatus::Open,
            )])],
            DiceAction::StartNew => {
                let round = view.round().next();
                vec![
                    Intent::UpdateShared(vec![
                        DiceField::Round(round),
                        DiceField::Status(DiceStatus::Running),
                    ]),
                    roll_for(round, rng),
                ]
            }
            DiceAction::JoinAndRoll | DiceAction::Reroll => vec![roll_for(view.round(), rng)],
        }
    }
}

fn roll_for<R: Rng + ?Sized>(round: Round, rng: &mut R) -> Intent<Dice> {
    Intent::SetParticipant {
        round: RoundTag::Played(round),
        data: DiceHand {
            dice: roll_hand(rng),
        },
    }
}

fn own_hand<'a>(view: &'a RoomView<Dice>, id: &ParticipantId) -> Option<&'a [Die]> {
    view.current_participant(id)
        .map(|record| record.data.dice.as_slice())
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// What the table shows for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceBoard {
    pub tally: Tally,
    pub bonus: Tally,
    /// Participants who rolled this round.
    pub ready: usize,
}

/// Sums every current-round hand. Hands from earlier rounds and
/// participants who only joined do not count.
pub fn board(view: &RoomView<Dice>, wildcard: bool) -> DiceBoard {
    let hands: Vec<&[Die]> = view
        .current_participants()
        .map(|(_, record)| record.data.dice.as_slice())
        .collect();
    DiceBoard {
        tally: tally(hands.iter().flat_map(|hand| hand.iter().copied()), wildcard),
        bonus: bonus(hands.iter().copied(), wildcard),
        ready: hands.len(),
    }
}

/// The one action the participant is offered right now.
pub fn next_action(view: &RoomView<Dice>, id: &ParticipantId) -> DiceAction {
    if view.shared().status != Some(DiceStatus::Running) {
        return DiceAction::StartNew;
    }
    match own_hand(view, id) {
        None => DiceAction::JoinAndRoll,
        Some(hand) if is_flush(hand) => DiceAction::Reroll,
        Some(_) => DiceAction::Open,
    }
}
