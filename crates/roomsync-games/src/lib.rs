//! Game rules for Roomsync.
//!
//! Each module is a set of pure functions plus a [`GameRules`]
//! implementation that a [`RoomSession`] drives:
//!
//! - [`dice`]: everyone rolls five dice; the table counts faces
//! - [`roulette`]: one host spins, everyone else bets
//! - [`kingjoker`]: two seated players race to reveal their special card
//!
//! [`GameRules`]: roomsync_room::GameRules
//! [`RoomSession`]: roomsync_room::RoomSession

pub mod dice;
pub mod kingjoker;
pub mod roulette;

pub use dice::Dice;
pub use kingjoker::KingJoker;
pub use roulette::Roulette;
