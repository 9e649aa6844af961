//! Multi-participant games played through room sessions on the
//! in-memory store.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use roomsync_games::dice::{self, Dice, DiceAction, DiceStatus};
use roomsync_games::kingjoker::{self, Card, KingJoker, KingJokerAction, Role};
use roomsync_games::roulette::{
    self, Bet, Color, Dozen, Roulette, RouletteAction, RouletteConfig, RouletteStatus,
};
use roomsync_protocol::{ParticipantId, RoomId, Round};
use roomsync_room::{GameRules, RoomConfig, RoomError, RoomSession};
use roomsync_session::Identity;
use roomsync_store::MemoryStore;

fn seat<G: GameRules>(store: &MemoryStore, id: &str) -> RoomSession<G, MemoryStore> {
    let nickname = id[..1].to_uppercase() + &id[1..];
    RoomSession::with_defaults(store.clone(), Identity::new(ParticipantId::new(id), nickname))
}

/// Re-reads the room so the rules see every write made so far.
async fn act<G: GameRules>(
    session: &RoomSession<G, MemoryStore>,
    action: G::Action,
) -> Result<(), RoomError> {
    session.refresh().await?;
    session.dispatch(action).await
}

/// Like [`act`], with a seeded generator so the outcome is known.
async fn act_seeded<G: GameRules>(
    session: &RoomSession<G, MemoryStore>,
    action: G::Action,
    seed: u64,
) -> Result<(), RoomError> {
    session.refresh().await?;
    session
        .dispatch_with_rng(action, &mut StdRng::seed_from_u64(seed))
        .await
}

/// A seed whose first spin lands on `number`.
fn seed_landing_on(number: u8) -> u64 {
    (0..)
        .find(|seed| roulette::spin_wheel(&mut StdRng::seed_from_u64(*seed)) == number)
        .unwrap()
}

fn after_reveal() -> Duration {
    RouletteConfig::default().reveal_delay + Duration::from_millis(1)
}

fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id)
}

// =========================================================================
// Dice
// =========================================================================

#[tokio::test]
async fn test_dice_board_counts_current_round_hands_only() {
    let store = MemoryStore::new();
    let room = RoomId::new("dice1");
    let players: Vec<RoomSession<Dice, MemoryStore>> =
        ["ann", "ben", "cat"].iter().map(|id| seat(&store, id)).collect();
    let mut handles = Vec::new();
    for player in &players {
        handles.push(player.join(room.clone()).await.unwrap());
    }
    let watcher = seat::<Dice>(&store, "dan");
    let _watcher = watcher.join(room.clone()).await.unwrap();

    // A fresh room is already running, so everyone rolls in round 1.
    for player in &players {
        act(player, DiceAction::JoinAndRoll).await.unwrap();
    }

    let view = watcher.refresh().await.unwrap().unwrap();
    assert_eq!(view.round(), Round::FIRST);
    assert_eq!(view.shared().status, Some(DiceStatus::Running));

    let board = dice::board(&view, false);
    assert_eq!(board.ready, 3);

    let all_dice = ["ann", "ben", "cat"].iter().flat_map(|id| {
        view.current_participant(&pid(id))
            .map(|record| record.data.dice.clone())
            .unwrap_or_default()
    });
    assert_eq!(board.tally, dice::tally(all_dice, false));
    let counted: u32 = board.tally.iter().map(|(_, count)| count).sum();
    assert_eq!(counted, 15);

    // Only joined: not on the board, offered a roll.
    assert!(view.current_participant(&pid("dan")).is_none());
    assert_eq!(dice::next_action(&view, &pid("dan")), DiceAction::JoinAndRoll);
}

#[tokio::test]
async fn test_dice_second_roll_in_round_is_rejected() {
    let store = MemoryStore::new();
    let ann = seat::<Dice>(&store, "ann");
    let _handle = ann.join(RoomId::new("dice2")).await.unwrap();

    act(&ann, DiceAction::JoinAndRoll).await.unwrap();
    assert!(matches!(
        act(&ann, DiceAction::JoinAndRoll).await,
        Err(RoomError::InvalidAction(_))
    ));

    act(&ann, DiceAction::StartNew).await.unwrap();
    assert!(matches!(
        act(&ann, DiceAction::JoinAndRoll).await,
        Err(RoomError::InvalidAction(_))
    ));

    act(&ann, DiceAction::Open).await.unwrap();
    let view = ann.refresh().await.unwrap().unwrap();
    assert_eq!(view.round(), Round(2));
    assert_eq!(view.shared().status, Some(DiceStatus::Open));
    assert_eq!(dice::next_action(&view, &pid("ann")), DiceAction::StartNew);
    assert!(matches!(
        act(&ann, DiceAction::JoinAndRoll).await,
        Err(RoomError::InvalidAction(_))
    ));
}

// =========================================================================
// Roulette
// =========================================================================

#[tokio::test]
async fn test_roulette_host_claim_is_first_come() {
    let store = MemoryStore::new();
    let room = RoomId::new("whl01");
    let ann = seat::<Roulette>(&store, "ann");
    let ben = seat::<Roulette>(&store, "ben");
    let _a = ann.join(room.clone()).await.unwrap();
    let _b = ben.join(room.clone()).await.unwrap();

    act(&ann, RouletteAction::ClaimHost).await.unwrap();
    // Ben's stale view still shows no host; the claim itself must lose.
    ben.dispatch(RouletteAction::ClaimHost).await.unwrap();
    act(&ben, RouletteAction::ClaimHost).await.unwrap();

    let view = ben.refresh().await.unwrap().unwrap();
    assert_eq!(view.shared().host_username, Some(pid("ann")));
    assert_eq!(view.shared().host_nickname.as_deref(), Some("Ann"));
    assert!(roulette::is_host(&view, &pid("ann")));
    assert!(!roulette::is_host(&view, &pid("ben")));

    assert!(matches!(
        act(&ben, RouletteAction::Spin).await,
        Err(RoomError::InvalidAction(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_roulette_spin_reveals_after_delay() {
    let store = MemoryStore::new();
    let room = RoomId::new("whl02");
    let ann = seat::<Roulette>(&store, "ann");
    let ben = seat::<Roulette>(&store, "ben");
    let _a = ann.join(room.clone()).await.unwrap();
    let _b = ben.join(room.clone()).await.unwrap();

    act(&ann, RouletteAction::ClaimHost).await.unwrap();
    act(&ben, RouletteAction::PlaceBet(Bet::Color { color: Color::Red })).await.unwrap();
    act(&ann, RouletteAction::Spin).await.unwrap();

    let spinning = ben.refresh().await.unwrap().unwrap();
    assert_eq!(roulette::status(&spinning), RouletteStatus::Spinning);
    let target = roulette::wheel_target(&spinning).unwrap();
    assert_eq!(roulette::revealed_number(&spinning), None);
    assert!(roulette::settlements(&spinning).iter().all(|s| s.won.is_none()));
    assert!(matches!(
        act(&ben, RouletteAction::ClearBet).await,
        Err(RoomError::InvalidAction(_))
    ));

    tokio::time::sleep(after_reveal()).await;

    let result = ben.refresh().await.unwrap().unwrap();
    assert_eq!(roulette::status(&result), RouletteStatus::Result);
    assert_eq!(roulette::revealed_number(&result), Some(target));
    let ben_line = roulette::settlements(&result)
        .into_iter()
        .find(|s| s.participant == pid("ben"))
        .unwrap();
    assert_eq!(ben_line.won, Some(Bet::Color { color: Color::Red }.wins(target)));

    act(&ann, RouletteAction::NextRound).await.unwrap();
    let next = ben.refresh().await.unwrap().unwrap();
    assert_eq!(next.round(), Round(2));
    assert_eq!(roulette::status(&next), RouletteStatus::Betting);
    assert_eq!(roulette::current_bet(&next, &pid("ben")), None);
    assert_eq!(roulette::revealed_number(&next), None);
}

#[tokio::test(start_paused = true)]
async fn test_roulette_settles_bets_on_known_number() {
    let store = MemoryStore::new();
    let room = RoomId::new("whl03");
    let ann = seat::<Roulette>(&store, "ann");
    let ben = seat::<Roulette>(&store, "ben");
    let cat = seat::<Roulette>(&store, "cat");
    let _a = ann.join(room.clone()).await.unwrap();
    let _b = ben.join(room.clone()).await.unwrap();
    let _c = cat.join(room.clone()).await.unwrap();

    act(&ann, RouletteAction::ClaimHost).await.unwrap();
    act(&ann, RouletteAction::PlaceBet(Bet::Color { color: Color::Red })).await.unwrap();
    act(&ben, RouletteAction::PlaceBet(Bet::Dozen { dozen: Dozen::First })).await.unwrap();
    act(&cat, RouletteAction::PlaceBet(Bet::Color { color: Color::Black })).await.unwrap();

    act_seeded(&ann, RouletteAction::Spin, seed_landing_on(5)).await.unwrap();
    tokio::time::sleep(after_reveal()).await;

    let view = cat.refresh().await.unwrap().unwrap();
    assert_eq!(roulette::revealed_number(&view), Some(5));
    let outcome: Vec<(String, Option<bool>)> = roulette::settlements(&view)
        .into_iter()
        .map(|s| (s.participant.as_str().to_string(), s.won))
        .collect();
    assert_eq!(
        outcome,
        vec![
            ("ann".to_string(), Some(true)),
            ("ben".to_string(), Some(true)),
            ("cat".to_string(), Some(false)),
        ]
    );
    assert_eq!(roulette::bets_placed(&view), 3);
}

#[tokio::test(start_paused = true)]
async fn test_roulette_next_round_waits_for_reveal() {
    let store = MemoryStore::new();
    let room = RoomId::new("whl04");
    let ann = seat::<Roulette>(&store, "ann");
    let ben = seat::<Roulette>(&store, "ben");
    let _a = ann.join(room.clone()).await.unwrap();
    let _b = ben.join(room.clone()).await.unwrap();

    act(&ann, RouletteAction::ClaimHost).await.unwrap();
    assert!(matches!(
        act(&ann, RouletteAction::NextRound).await,
        Err(RoomError::InvalidAction(_))
    ));

    act_seeded(&ann, RouletteAction::Spin, seed_landing_on(17)).await.unwrap();
    assert!(matches!(
        act(&ann, RouletteAction::NextRound).await,
        Err(RoomError::InvalidAction(_))
    ));

    tokio::time::sleep(after_reveal()).await;
    act(&ann, RouletteAction::NextRound).await.unwrap();
    act(&ben, RouletteAction::PlaceBet(Bet::Color { color: Color::Black })).await.unwrap();

    let view = ben.refresh().await.unwrap().unwrap();
    assert_eq!(view.round(), Round(2));
    assert_eq!(roulette::status(&view), RouletteStatus::Betting);
    assert_eq!(
        roulette::current_bet(&view, &pid("ben")),
        Some(Bet::Color { color: Color::Black })
    );
    assert_eq!(roulette::revealed_number(&view), None);
}

// =========================================================================
// King/Joker
// =========================================================================

#[tokio::test]
async fn test_kingjoker_round_and_role_swap() {
    let store = MemoryStore::new();
    let room = RoomId::new("kj001");
    let ann = seat::<KingJoker>(&store, "ann");
    let ben = seat::<KingJoker>(&store, "ben");
    let cat = seat::<KingJoker>(&store, "cat");
    let _a = ann.join(room.clone()).await.unwrap();
    let _b = ben.join(room.clone()).await.unwrap();
    let _c = cat.join(room.clone()).await.unwrap();

    act(&ann, KingJokerAction::Join).await.unwrap();
    act(&ben, KingJokerAction::Join).await.unwrap();
    assert!(matches!(
        act(&cat, KingJokerAction::Join).await,
        Err(RoomError::InvalidAction(_))
    ));

    let view = cat.refresh().await.unwrap().unwrap();
    assert_eq!(kingjoker::role_of(&view, &pid("ann")), Role::King);
    assert_eq!(kingjoker::role_of(&view, &pid("ben")), Role::Joker);
    assert_eq!(kingjoker::role_of(&view, &pid("cat")), Role::Spectator);

    act(&ann, KingJokerAction::Play { special: false }).await.unwrap();
    let view = ben.refresh().await.unwrap().unwrap();
    assert!(!kingjoker::is_round_over(&view));

    act(&ben, KingJokerAction::Play { special: true }).await.unwrap();
    let view = ann.refresh().await.unwrap().unwrap();
    assert!(kingjoker::is_round_over(&view));
    let (king, joker) = kingjoker::seated_hands(&view);
    assert_eq!(king.cards_played, vec![Card::Normal]);
    assert_eq!(joker.cards_played, vec![Card::Joker]);
    assert!(matches!(
        act(&ann, KingJokerAction::Play { special: false }).await,
        Err(RoomError::InvalidAction(_))
    ));

    act(&ben, KingJokerAction::StartNew).await.unwrap();
    let view = cat.refresh().await.unwrap().unwrap();
    assert_eq!(view.round(), Round(2));
    assert_eq!(kingjoker::role_of(&view, &pid("ben")), Role::King);
    assert_eq!(kingjoker::role_of(&view, &pid("ann")), Role::Joker);
    assert!(kingjoker::hand_of(&view, &pid("ann")).cards_played.is_empty());
    assert!(!kingjoker::is_round_over(&view));
}

#[tokio::test]
async fn test_kingjoker_force_join_takes_seat() {
    let store = MemoryStore::new();
    let room = RoomId::new("kj002");
    let ann = seat::<KingJoker>(&store, "ann");
    let cat = seat::<KingJoker>(&store, "cat");
    let _a = ann.join(room.clone()).await.unwrap();
    let _c = cat.join(room.clone()).await.unwrap();

    act(&ann, KingJokerAction::Join).await.unwrap();
    act(&cat, KingJokerAction::ForceJoin { as_king: true }).await.unwrap();

    let view = ann.refresh().await.unwrap().unwrap();
    assert_eq!(kingjoker::role_of(&view, &pid("cat")), Role::King);
    assert_eq!(kingjoker::role_of(&view, &pid("ann")), Role::Spectator);
    assert!(matches!(
        act(&ann, KingJokerAction::StartNew).await,
        Err(RoomError::InvalidAction(_))
    ));
}

#[tokio::test]
async fn test_sessions_use_configured_root() {
    let store = MemoryStore::new();
    let config = RoomConfig {
        root: "party".to_string(),
    };
    let ann: RoomSession<Dice, MemoryStore> = RoomSession::new(
        store.clone(),
        Identity::new(pid("ann"), "Ann"),
        config.clone(),
        Default::default(),
    );
    let _a = ann.join(RoomId::new("dice3")).await.unwrap();

    let directory = roomsync_room::RoomDirectory::new(store, config);
    let entries = directory.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].room_id.as_str(), "dice3");
}
