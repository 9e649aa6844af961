//! Roulette on a single-zero wheel.
//!
//! One participant claims the host seat and drives the rounds; everyone
//! places at most one even-money or dozen bet per round.
//!
//! Round flow (shared `status`):
//!
//! ```text
//! betting ──spin──→ spinning ──(reveal delay)──→ result
//!    ↑                                              │
//!    └──────────────── next round ───────────────────┘
//! ```
//!
//! The winning number is written with the `spinning` status so every
//! observer can animate the same spin, and disclosed as `lastSpin` once
//! the reveal delay has passed.
//!
//! Bets:
//! - Color: red or black
//! - Parity: odd or even
//! - Range: low (1-18) or high (19-36)
//! - Dozen: 1st (1-12), 2nd (13-24) or 3rd (25-36)
//!
//! Zero loses every bet.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use roomsync_protocol::{GameKind, ParticipantId, Round, RoundTag, Stamp};
use roomsync_room::{GameRules, Intent, RoomView};
use roomsync_session::Identity;
use serde::{Deserialize, Serialize};

/// Highest number on the wheel.
pub const MAX_NUMBER: u8 = 36;

/// Red numbers on the wheel.
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

/// The colour of a pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pocket {
    Green,
    Red,
    Black,
}

/// Classifies a number on the wheel.
pub fn pocket(number: u8) -> Pocket {
    if number == 0 {
        Pocket::Green
    } else if RED_NUMBERS.contains(&number) {
        Pocket::Red
    } else {
        Pocket::Black
    }
}

/// Draws a winning number uniformly from `0..=36`.
pub fn spin_wheel<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(0..=MAX_NUMBER)
}

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Range {
    /// 1-18
    Low,
    /// 19-36
    High,
}

/// A third of the table, stored as `1`, `2` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dozen {
    First,
    Second,
    Third,
}

impl Dozen {
    /// Inclusive bounds of this dozen.
    pub fn bounds(self) -> (u8, u8) {
        match self {
            Self::First => (1, 12),
            Self::Second => (13, 24),
            Self::Third => (25, 36),
        }
    }
}

impl TryFrom<u8> for Dozen {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            _ => Err(format!("dozen {value} is not 1, 2 or 3")),
        }
    }
}

impl From<Dozen> for u8 {
    fn from(dozen: Dozen) -> Self {
        match dozen {
            Dozen::First => 1,
            Dozen::Second => 2,
            Dozen::Third => 3,
        }
    }
}

/// A single bet, stored as `{ "kind": "color", "color": "red" }` etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Bet {
    Color { color: Color },
    Parity { parity: Parity },
    Range { range: Range },
    Dozen { dozen: Dozen },
}

impl Bet {
    /// Returns `true` if this bet wins when the ball lands on `number`.
    pub fn wins(&self, number: u8) -> bool {
        if number == 0 || number > MAX_NUMBER {
            return false;
        }
        match self {
            Self::Color { color } => match pocket(number) {
                Pocket::Red => *color == Color::Red,
                Pocket::Black => *color == Color::Black,
                Pocket::Green => false,
            },
            Self::Parity { parity } => {
                let even = number % 2 == 0;
                match parity {
                    Parity::Even => even,
                    Parity::Odd => !even,
                }
            }
            Self::Range { range } => match range {
                Range::Low => number <= 18,
                Range::High => number >= 19,
            },
            Self::Dozen { dozen } => {
                let (low, high) = dozen.bounds();
                (low..=high).contains(&number)
            }
        }
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Color { color: Color::Red } => "Red",
            Self::Color { color: Color::Black } => "Black",
            Self::Parity { parity: Parity::Odd } => "Odd",
            Self::Parity { parity: Parity::Even } => "Even",
            Self::Range { range: Range::Low } => "1-18",
            Self::Range { range: Range::High } => "19-36",
            Self::Dozen { dozen: Dozen::First } => "1st dozen (1-12)",
            Self::Dozen { dozen: Dozen::Second } => "2nd dozen (13-24)",
            Self::Dozen { dozen: Dozen::Third } => "3rd dozen (25-36)",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Room data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouletteStatus {
    Betting,
    Spinning,
    Result,
}

/// A spin in progress. The number is already decided but not yet shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spin {
    pub round: Round,
    pub winning_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Stamp>,
}

/// The revealed outcome of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSpin {
    pub round: Round,
    pub winning_number: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouletteShared {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RouletteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_username: Option<ParticipantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spin: Option<Spin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_spin: Option<LastSpin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouletteHand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet: Option<Bet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouletteField {
    Status(RouletteStatus),
    Round(Round),
    HostNickname(String),
    Spin(Spin),
    LastSpin(LastSpin),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouletteHandField {
    Round(RoundTag),
    /// `None` removes the bet.
    Bet(Option<Bet>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouletteAction {
    ClaimHost,
    PlaceBet(Bet),
    ClearBet,
    /// Host only.
    Spin,
    /// Host only.
    NextRound,
}

/// Roulette settings.
#[derive(Debug, Clone)]
pub struct RouletteConfig {
    /// Time between the spin starting and the result being written.
    pub reveal_delay: Duration,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(4200),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The roulette game.
pub struct Roulette;

impl GameRules for Roulette {
    const GAME: GameKind = GameKind::Roulette;

    type Config = RouletteConfig;
    type Shared = RouletteShared;
    type Participant = RouletteHand;
    type SharedField = RouletteField;
    type ParticipantField = RouletteHandField;
    type Action = RouletteAction;

    fn initial_shared(_config: &RouletteConfig) -> Vec<RouletteField> {
        vec![RouletteField::Status(RouletteStatus::Betting)]
    }

    /// Host checks are advisory: they stop an honest client from offering
    /// the action, nothing in the store enforces them.
    fn validate_action(
        _config: &RouletteConfig,
        view: &RoomView<Self>,
        actor: &Identity,
        action: &RouletteAction,
    ) -> Result<(), String> {
        let status = status(view);
        match action {
            RouletteAction::ClaimHost => Ok(()),
            RouletteAction::PlaceBet(_) | RouletteAction::ClearBet => {
                if status != RouletteStatus::Betting {
                    return Err("betting is closed for this round".into());
                }
                Ok(())
            }
            RouletteAction::Spin => {
                if !is_host(view, actor.participant_id()) {
                    return Err("only the host can spin".into());
                }
                if status != RouletteStatus::Betting {
                    return Err("the wheel has already been spun".into());
                }
                Ok(())
            }
            RouletteAction::NextRound => {
                if !is_host(view, actor.participant_id()) {
                    return Err("only the host can start the next round".into());
                }
                if status != RouletteStatus::Result {
                    return Err("the result of this round is not in yet".into());
                }
                Ok(())
            }
        }
    }

    fn handle_action<R: Rng + ?Sized>(
        config: &RouletteConfig,
        view: &RoomView<Self>,
        actor: &Identity,
        action: RouletteAction,
        rng: &mut R,
    ) -> Vec<Intent<Self>> {
        let round = view.round();
        match action {
            RouletteAction::ClaimHost => {
                if view.shared().host_username.is_some() {
                    return Vec::new();
                }
                let then = actor
                    .stamped_nickname()
                    .map(RouletteField::HostNickname)
                    .into_iter()
                    .collect();
                vec![Intent::ClaimHost { then }]
            }
            RouletteAction::PlaceBet(bet) => vec![Intent::SetParticipant {
                round: RoundTag::Played(round),
                data: RouletteHand { bet: Some(bet) },
            }],
            RouletteAction::ClearBet => vec![Intent::UpdateParticipant(vec![
                RouletteHandField::Round(RoundTag::Played(round)),
                RouletteHandField::Bet(None),
            ])],
            RouletteAction::Spin => {
                let winning_number = spin_wheel(rng);
                vec![
                    Intent::UpdateShared(vec![
                        RouletteField::Status(RouletteStatus::Spinning),
                        RouletteField::Spin(Spin {
                            round,
                            winning_number,
                            started_at: Some(Stamp::Server),
                        }),
                    ]),
                    Intent::Deferred {
                        after: config.reveal_delay,
                        fields: vec![
                            RouletteField::Status(RouletteStatus::Result),
                            RouletteField::LastSpin(LastSpin {
                                round,
                                winning_number,
                            }),
                        ],
                    },
                ]
            }
            RouletteAction::NextRound => vec![Intent::UpdateShared(vec![
                RouletteField::Status(RouletteStatus::Betting),
                RouletteField::Round(round.next()),
            ])],
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The room's status, treating a missing one as betting.
pub fn status(view: &RoomView<Roulette>) -> RouletteStatus {
    view.shared().status.unwrap_or(RouletteStatus::Betting)
}

/// Returns `true` if `id` holds the host seat.
pub fn is_host(view: &RoomView<Roulette>, id: &ParticipantId) -> bool {
    view.shared().host_username.as_ref() == Some(id)
}

/// The participant's bet for the current round, if any.
pub fn current_bet(view: &RoomView<Roulette>, id: &ParticipantId) -> Option<Bet> {
    view.current_participant(id).and_then(|record| record.data.bet)
}

/// How many current-round participants have a bet down.
pub fn bets_placed(view: &RoomView<Roulette>) -> usize {
    view.current_participants()
        .filter(|(_, record)| record.data.bet.is_some())
        .count()
}

/// The winning number once it has been revealed for the current round.
pub fn revealed_number(view: &RoomView<Roulette>) -> Option<u8> {
    view.shared()
        .last_spin
        .filter(|spin| spin.round == view.round())
        .map(|spin| spin.winning_number)
}

/// The number the wheel should land on: the pending spin while spinning,
/// otherwise the revealed result.
pub fn wheel_target(view: &RoomView<Roulette>) -> Option<u8> {
    let pending = view
        .shared()
        .spin
        .filter(|spin| status(view) == RouletteStatus::Spinning && spin.round == view.round())
        .map(|spin| spin.winning_number);
    pending.or_else(|| revealed_number(view))
}

/// One line of the round's result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub participant: ParticipantId,
    pub nickname: String,
    pub bet: Option<Bet>,
    /// `None` until the winning number is revealed.
    pub won: Option<bool>,
}

/// Every current-round participant with their bet and outcome.
pub fn settlements(view: &RoomView<Roulette>) -> Vec<Settlement> {
    let revealed = revealed_number(view);
    view.current_participants()
        .map(|(id, record)| Settlement {
            participant: id.clone(),
            nickname: record.display_name().to_string(),
            bet: record.data.bet,
            won: revealed.map(|n| record.data.bet.is_some_and(|bet| bet.wins(n))),
        })
        .collect()
}
