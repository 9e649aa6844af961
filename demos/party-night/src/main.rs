use std::time::Duration;

use roomsync::games::dice::{self, Dice, DiceAction};
use roomsync::games::kingjoker::{self, KingJoker, KingJokerAction};
use roomsync::games::roulette::{
    self, Bet, Color, Dozen, Parity, Roulette, RouletteAction, RouletteConfig,
};
use roomsync::prelude::*;

// ---------------------------------------------------------------------------
// Table setup
// ---------------------------------------------------------------------------

const GUESTS: [&str; 3] = ["Ada", "Bo", "Cy"];

fn guests<G: GameRules>(
    store: &MemoryStore,
    rules: G::Config,
) -> Vec<RoomSession<G, MemoryStore>> {
    GUESTS
        .iter()
        .map(|nickname| {
            let id = ParticipantId::new(nickname.to_lowercase());
            RoomSession::new(
                store.clone(),
                Identity::new(id, *nickname),
                RoomConfig::default(),
                rules.clone(),
            )
        })
        .collect()
}

async fn join_all<G: GameRules>(
    sessions: &[RoomSession<G, MemoryStore>],
    room_id: &RoomId,
) -> Result<Vec<CancelHandle>, RoomsyncError> {
    let mut handles = Vec::with_capacity(sessions.len());
    for session in sessions {
        handles.push(session.join(room_id.clone()).await?);
    }
    Ok(handles)
}

/// Dispatches against a fresh read of the room.
async fn play<G: GameRules>(
    session: &RoomSession<G, MemoryStore>,
    action: G::Action,
) -> Result<(), RoomsyncError> {
    session.refresh().await?;
    session.dispatch(action).await?;
    Ok(())
}

async fn view_of<G: GameRules>(
    session: &RoomSession<G, MemoryStore>,
) -> Result<RoomView<G>, RoomsyncError> {
    let view = session.refresh().await?;
    Ok(view.unwrap_or_else(|| RoomView::empty(RoomId::new(""))))
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

async fn dice_round(store: &MemoryStore) -> Result<dice::DiceBoard, RoomsyncError> {
    let room_id = RoomId::new("dice1");
    let table = guests::<Dice>(store, Default::default());
    let handles = join_all(&table, &room_id).await?;

    // A fresh room starts out running.
    for guest in &table {
        play(guest, DiceAction::JoinAndRoll).await?;
    }

    let view = view_of(&table[0]).await?;
    let board = dice::board(&view, true);
    println!("dice round {}: {} rolled", view.round(), board.ready);
    for (face, count) in board.tally.iter() {
        println!("  {face}: {count} (+{} bonus)", board.bonus.count(face));
    }

    play(&table[0], DiceAction::Open).await?;
    handles.into_iter().for_each(CancelHandle::cancel);
    Ok(board)
}

async fn roulette_round(store: &MemoryStore) -> Result<Vec<roulette::Settlement>, RoomsyncError> {
    let room_id = RoomId::new("whl01");
    let config = RouletteConfig {
        reveal_delay: Duration::from_millis(300),
    };
    let table = guests::<Roulette>(store, config.clone());
    let handles = join_all(&table, &room_id).await?;

    for guest in &table {
        play(guest, RouletteAction::ClaimHost).await?;
    }
    let bets = [
        Bet::Color { color: Color::Red },
        Bet::Parity { parity: Parity::Even },
        Bet::Dozen { dozen: Dozen::Third },
    ];
    for (guest, bet) in table.iter().zip(bets) {
        play(guest, RouletteAction::PlaceBet(bet)).await?;
    }

    let view = view_of(&table[0]).await?;
    let Some(host) = table
        .iter()
        .find(|guest| roulette::is_host(&view, guest.identity().participant_id()))
    else {
        return Err(RoomError::InvalidAction("nobody holds the host seat".into()).into());
    };
    tracing::info!(
        host = %host.identity().nickname(),
        bets = roulette::bets_placed(&view),
        "spinning"
    );
    play(host, RouletteAction::Spin).await?;

    tokio::time::sleep(config.reveal_delay + Duration::from_millis(50)).await;
    let view = view_of(host).await?;
    let results = roulette::settlements(&view);
    if let Some(number) = roulette::revealed_number(&view) {
        println!("roulette landed on {number} ({:?})", roulette::pocket(number));
    }
    for line in &results {
        let bet = line.bet.map_or_else(|| "no bet".to_string(), |bet| bet.to_string());
        let outcome = match line.won {
            Some(true) => "wins",
            Some(false) => "loses",
            None => "waiting",
        };
        println!("  {} on {bet}: {outcome}", line.nickname);
    }

    play(host, RouletteAction::NextRound).await?;
    handles.into_iter().for_each(CancelHandle::cancel);
    Ok(results)
}

async fn king_joker_round(store: &MemoryStore) -> Result<u32, RoomsyncError> {
    let room_id = RoomId::new("kj001");
    let table = guests::<KingJoker>(store, Default::default());
    let handles = join_all(&table, &room_id).await?;

    play(&table[0], KingJokerAction::Join).await?;
    play(&table[1], KingJokerAction::Join).await?;

    let mut turns = 0;
    while !kingjoker::is_round_over(&view_of(&table[0]).await?) {
        // The joker bluffs for two turns, then plays the special card.
        play(&table[0], KingJokerAction::Play { special: false }).await?;
        play(&table[1], KingJokerAction::Play { special: turns >= 2 }).await?;
        turns += 1;
    }
    println!("king/joker round decided after {turns} turns");

    play(&table[1], KingJokerAction::StartNew).await?;
    handles.into_iter().for_each(CancelHandle::cancel);
    Ok(turns)
}

#[tokio::main]
async fn main() -> Result<(), RoomsyncError> {
    roomsync::logging::init();

    let store = MemoryStore::new();
    dice_round(&store).await?;
    roulette_round(&store).await?;
    king_joker_round(&store).await?;

    let directory = RoomDirectory::new(store, RoomConfig::default());
    println!("rooms:");
    for entry in directory.list().await? {
        println!(
            "  {} {} round {} ({} players)",
            entry.room_id,
            entry
                .summary
                .game_id
                .map_or_else(|| "?".to_string(), |game| game.to_string()),
            entry.summary.round.unwrap_or(Round::FIRST),
            entry.participant_count,
        );
    }
    directory.clear().await?;
    Ok(())
}
