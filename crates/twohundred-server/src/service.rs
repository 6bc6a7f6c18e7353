//! Action entry points and the bot driver.
//!
//! Every action locks its game, runs through `GameState::apply_action`, and
//! queues the resulting messages. Messages go out only after the lock is
//! released. When the next seat belongs to a bot, a driver task takes over
//! until a human is on turn again.

use crate::protocol::{EndReason, ServerMessage};
use crate::registry::{GameRegistry, Outbox, ServiceError};
use crate::table::{GameTable, Occupant};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use twohundred_core::{
    Bot, BotSkill, Card, ConfigError, ErrorKind, GameAction, GameConfig, GameError, GameEvent,
    GameState, Seat, SeatConfig, Suit,
};
use uuid::Uuid;

/// Who should sit in a seat of a new game
#[derive(Debug, Clone)]
pub enum SeatRequest {
    Human { player_id: Uuid, name: String },
    Bot { skill: BotSkill },
}

/// Seat four players, deal the first round, and start bots if one opens
pub fn create_game(
    registry: &Arc<GameRegistry>,
    config: GameConfig,
    seats: Vec<SeatRequest>,
) -> Result<Uuid, ServiceError> {
    config.validate()?;
    if seats.len() != 4 {
        return Err(ConfigError::SeatCount(seats.len()).into());
    }

    let game_id = Uuid::new_v4();
    let mut seat_configs = Vec::with_capacity(seats.len());
    let mut occupants = Vec::with_capacity(seats.len());

    for (index, request) in seats.into_iter().enumerate() {
        match request {
            SeatRequest::Human { player_id, name } => {
                seat_configs.push(SeatConfig::human(name));
                occupants.push(Occupant::Human(player_id));
            }
            SeatRequest::Bot { skill } => {
                let identity = registry.take_bot(skill);
                seat_configs.push(SeatConfig::bot(identity.name.clone(), skill));
                occupants.push(Occupant::Bot {
                    identity,
                    bot: Bot::new(index as Seat, skill),
                });
            }
        }
    }

    let mut game = GameState::new(config, seat_configs)?;
    let events = game.start()?;

    let mut table = GameTable::new(game_id, game, occupants);
    let outbox = outbox_for(&table, &events);
    let bot_opens = table.is_bot_turn();
    table.driving = bot_opens;

    info!(
        %game_id,
        humans = table.humans().len(),
        dealer = table.game.dealer,
        "Game created"
    );
    registry.insert(table);
    registry.deliver(outbox);

    if bot_opens {
        spawn_driver(Arc::clone(registry), game_id, Duration::ZERO);
    }
    Ok(game_id)
}

/// Bid `points` naming `suit`; zero points is a pass
pub async fn submit_bid(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
    points: u32,
    suit: Option<Suit>,
) -> Result<(), ServiceError> {
    submit(registry, game_id, player_id, GameAction::Bid { points, suit }).await
}

pub async fn pass_bid(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    submit(registry, game_id, player_id, GameAction::Pass).await
}

pub async fn take_kitty(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    submit(registry, game_id, player_id, GameAction::TakeKitty).await
}

pub async fn discard_to_kitty(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
    cards: Vec<Card>,
    trump: Suit,
) -> Result<(), ServiceError> {
    submit(
        registry,
        game_id,
        player_id,
        GameAction::DiscardToKitty { cards, trump },
    )
    .await
}

pub async fn play_card(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
    card: Card,
) -> Result<(), ServiceError> {
    submit(registry, game_id, player_id, GameAction::PlayCard(card)).await
}

/// A human left; the table can no longer continue
pub async fn leave(registry: &Arc<GameRegistry>, player_id: Uuid) -> Result<(), ServiceError> {
    let game_id = registry
        .game_of(player_id)
        .ok_or(ServiceError::PlayerNotSeated(player_id))?;
    let table = registry.get(game_id)?;
    let mut guard = table.lock().await;

    let outbox = end_game(registry, &mut guard, EndReason::InsufficientPlayers);
    drop(guard);

    info!(%game_id, %player_id, "Player left, game ended");
    registry.deliver(outbox);
    Ok(())
}

async fn submit(
    registry: &Arc<GameRegistry>,
    game_id: Uuid,
    player_id: Uuid,
    action: GameAction,
) -> Result<(), ServiceError> {
    let table = registry.get(game_id)?;
    let mut guard = table.lock().await;

    // The game may have been closed while we waited for the lock
    if !registry.contains(game_id) {
        return Err(ServiceError::GameNotFound(game_id));
    }
    let seat = guard
        .seat_of(player_id)
        .ok_or(ServiceError::PlayerNotSeated(player_id))?;

    match guard.apply(seat, action) {
        Ok(events) => {
            let outbox = outbox_for(&guard, &events);
            log_milestones(game_id, &events);

            if guard.game.is_finished() {
                retire(registry, &mut guard);
            }

            let pause = if completes_trick(&events) {
                registry.config.trick_pause
            } else {
                Duration::ZERO
            };
            let start_driver = guard.is_bot_turn() && !guard.driving;
            if start_driver {
                guard.driving = true;
            }
            drop(guard);

            registry.deliver(outbox);
            if start_driver {
                spawn_driver(Arc::clone(registry), game_id, pause);
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::InvariantViolation => {
            let outbox = abort(registry, &mut guard, &e);
            drop(guard);
            registry.deliver(outbox);
            Err(e.into())
        }
        Err(e) => {
            drop(guard);
            debug!(%game_id, %player_id, error = %e, "Action rejected");
            registry.send_to_player(
                player_id,
                ServerMessage::ActionRejected {
                    game_id,
                    kind: e.kind(),
                    message: e.to_string(),
                },
            );
            Err(e.into())
        }
    }
}

fn spawn_driver(registry: Arc<GameRegistry>, game_id: Uuid, first_pause: Duration) {
    tokio::spawn(async move {
        drive_bots(registry, game_id, first_pause).await;
    });
}

/// Play bot turns one at a time until a human must act or the game is gone.
///
/// The lock is never held across a sleep. After each sleep the game is
/// looked up again, so a game removed by the timeout monitor or a departing
/// player stops the loop.
pub async fn drive_bots(registry: Arc<GameRegistry>, game_id: Uuid, first_pause: Duration) {
    let mut pause = first_pause;

    loop {
        tokio::time::sleep(pause + registry.config.bot_think).await;

        let Ok(table) = registry.get(game_id) else {
            debug!(%game_id, "Game gone, bot driver stopping");
            return;
        };
        let mut guard = table.lock().await;
        if !registry.contains(game_id) {
            return;
        }

        let seat = guard.game.current_player;
        if !guard.is_bot_turn() {
            guard.driving = false;
            return;
        }

        let action = match guard.bot_action(seat) {
            Ok(Some(action)) => action,
            Ok(None) => {
                guard.driving = false;
                return;
            }
            Err(e) => {
                let outbox = abort(&registry, &mut guard, &e);
                drop(guard);
                registry.deliver(outbox);
                return;
            }
        };
        debug!(%game_id, seat, ?action, "Bot decision");

        let events = match guard.apply(seat, action) {
            Ok(events) => events,
            Err(e) => {
                // A bot choosing an illegal move is an engine defect
                let violation = GameError::InvariantViolation(format!("bot at seat {seat}: {e}"));
                let outbox = abort(&registry, &mut guard, &violation);
                drop(guard);
                registry.deliver(outbox);
                return;
            }
        };

        let outbox = outbox_for(&guard, &events);
        log_milestones(game_id, &events);
        if guard.game.is_finished() {
            retire(&registry, &mut guard);
        }
        let keep_going = guard.is_bot_turn();
        if !keep_going {
            guard.driving = false;
        }
        drop(guard);

        registry.deliver(outbox);
        if !keep_going {
            return;
        }
        pause = if completes_trick(&events) {
            registry.config.trick_pause
        } else {
            Duration::ZERO
        };
    }
}

/// Public messages for every human at the table, each followed by that
/// seat's own snapshot
fn outbox_for(table: &GameTable, events: &[GameEvent]) -> Outbox {
    let public: Vec<ServerMessage> = events
        .iter()
        .map(|event| ServerMessage::from_event(table.id, event, &table.game))
        .collect();

    let mut outbox = Outbox::new();
    for (player_id, seat) in table.humans() {
        for msg in &public {
            outbox.push((player_id, msg.clone()));
        }
        if let Some(view) = table.game.view_for(seat) {
            outbox.push((
                player_id,
                ServerMessage::StateSnapshot {
                    game_id: table.id,
                    view,
                },
            ));
        }
    }
    outbox
}

fn completes_trick(events: &[GameEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, GameEvent::TrickCompleted { .. }))
}

fn log_milestones(game_id: Uuid, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::RoundCompleted {
                round, team_scores, ..
            } => info!(%game_id, round, ?team_scores, "Round completed"),
            GameEvent::GameEnded {
                winner,
                team_scores,
            } => info!(%game_id, ?winner, ?team_scores, "Game ended"),
            _ => {}
        }
    }
}

/// Drop a finished game from the registry and free its seats
fn retire(registry: &GameRegistry, table: &mut GameTable) -> Vec<Uuid> {
    if registry.remove(table.id) {
        registry.release_seats(table)
    } else {
        Vec::new()
    }
}

/// Close a live game early and tell the humans why
fn end_game(registry: &GameRegistry, table: &mut GameTable, reason: EndReason) -> Outbox {
    let game_id = table.id;
    let winner = table.game.winner();
    let team_scores = table.game.team_scores;

    retire(registry, table)
        .into_iter()
        .map(|player_id| {
            (
                player_id,
                ServerMessage::GameEnded {
                    game_id,
                    reason,
                    winner,
                    team_scores,
                },
            )
        })
        .collect()
}

fn abort(registry: &GameRegistry, table: &mut GameTable, violation: &GameError) -> Outbox {
    error!(game_id = %table.id, error = %violation, "Invariant violated, aborting game");
    end_game(registry, table, EndReason::Aborted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn registry() -> Arc<GameRegistry> {
        Arc::new(GameRegistry::new(ServerConfig::immediate()))
    }

    type Client = (Uuid, UnboundedReceiver<ServerMessage>);

    fn humans(registry: &GameRegistry) -> (Vec<SeatRequest>, Vec<Client>) {
        let mut seats = Vec::new();
        let mut clients = Vec::new();
        for i in 0..4 {
            let player_id = Uuid::new_v4();
            clients.push((player_id, registry.connect(player_id)));
            seats.push(SeatRequest::Human {
                player_id,
                name: format!("P{i}"),
            });
        }
        (seats, clients)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    async fn current_player_id(registry: &GameRegistry, game_id: Uuid, clients: &[Client]) -> Uuid {
        let table = registry.get(game_id).unwrap();
        let guard = table.lock().await;
        let seat = guard.game.current_player;
        clients
            .iter()
            .map(|(id, _)| *id)
            .find(|id| guard.seat_of(*id) == Some(seat))
            .unwrap()
    }

    /// Block until no bot is on turn, then return the human's first legal action
    async fn wait_for_human(registry: &GameRegistry, game_id: Uuid) -> GameAction {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let table = registry.get(game_id).unwrap();
                let guard = table.lock().await;
                if !guard.is_bot_turn() && !guard.driving {
                    let seat = guard.game.current_player;
                    return guard.game.valid_actions(seat).remove(0);
                }
                drop(guard);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_sends_snapshots() {
        let registry = registry();
        let (seats, mut clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();

        assert!(registry.contains(game_id));
        for (player_id, rx) in clients.iter_mut() {
            assert_eq!(registry.game_of(*player_id), Some(game_id));
            let msgs = drain(rx);
            assert!(matches!(msgs.first(), Some(ServerMessage::GameUpdated { .. })));
            match msgs.last() {
                Some(ServerMessage::StateSnapshot { view, .. }) => assert_eq!(view.hand.len(), 9),
                other => panic!("expected a snapshot, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_bad_config_is_rejected() {
        let registry = registry();
        let (seats, _clients) = humans(&registry);
        let config = GameConfig {
            score_target: 250,
            ..GameConfig::default()
        };
        let err = create_game(&registry, config, seats).unwrap_err();
        assert!(matches!(err, ServiceError::Config(ConfigError::ScoreTarget(250))));
        assert_eq!(registry.game_count(), 0);
    }

    #[tokio::test]
    async fn test_out_of_turn_is_rejected_to_caller_only() {
        let registry = registry();
        let (seats, mut clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();
        let current = current_player_id(&registry, game_id, &clients).await;
        for (_, rx) in clients.iter_mut() {
            drain(rx);
        }

        let (other, _) = clients.iter().find(|(id, _)| *id != current).unwrap();
        let other = *other;
        let err = submit_bid(&registry, game_id, other, 60, Some(Suit::Spades))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));

        for (player_id, rx) in clients.iter_mut() {
            let msgs = drain(rx);
            if *player_id == other {
                assert!(matches!(
                    msgs.as_slice(),
                    [ServerMessage::ActionRejected {
                        kind: ErrorKind::InvalidAction,
                        ..
                    }]
                ));
            } else {
                assert!(msgs.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_bid_is_broadcast() {
        let registry = registry();
        let (seats, mut clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();
        let current = current_player_id(&registry, game_id, &clients).await;
        for (_, rx) in clients.iter_mut() {
            drain(rx);
        }

        submit_bid(&registry, game_id, current, 65, Some(Suit::Clubs))
            .await
            .unwrap();
        for (_, rx) in clients.iter_mut() {
            let msgs = drain(rx);
            assert!(matches!(
                msgs.first(),
                Some(ServerMessage::BidMade { points: 65, suit: Some(Suit::Clubs), .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_game_and_player() {
        let registry = registry();
        let err = pass_bid(&registry, Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let (seats, _clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();
        let stranger = Uuid::new_v4();
        let err = take_kitty(&registry, game_id, stranger).await.unwrap_err();
        assert!(matches!(err, ServiceError::PlayerNotSeated(id) if id == stranger));
    }

    #[tokio::test]
    async fn test_leave_ends_game() {
        let registry = registry();
        let (seats, mut clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();
        for (_, rx) in clients.iter_mut() {
            drain(rx);
        }

        let leaver = clients[1].0;
        leave(&registry, leaver).await.unwrap();

        assert!(!registry.contains(game_id));
        for (player_id, rx) in clients.iter_mut() {
            assert_eq!(registry.game_of(*player_id), None);
            let msgs = drain(rx);
            assert!(matches!(
                msgs.as_slice(),
                [ServerMessage::GameEnded {
                    reason: EndReason::InsufficientPlayers,
                    ..
                }]
            ));
        }
        assert!(leave(&registry, leaver).await.is_err());
    }

    #[tokio::test]
    async fn test_invariant_violation_aborts() {
        let registry = registry();
        let (seats, mut clients) = humans(&registry);
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();
        let current = current_player_id(&registry, game_id, &clients).await;

        {
            let table = registry.get(game_id).unwrap();
            let mut guard = table.lock().await;
            let victim = (guard.game.current_player + 1) % 4;
            guard.game.players[victim as usize].hand.pop();
        }
        for (_, rx) in clients.iter_mut() {
            drain(rx);
        }

        let err = pass_bid(&registry, game_id, current).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(!registry.contains(game_id));
        for (_, rx) in clients.iter_mut() {
            assert!(matches!(
                drain(rx).as_slice(),
                [ServerMessage::GameEnded {
                    reason: EndReason::Aborted,
                    ..
                }]
            ));
        }
    }

    #[tokio::test]
    async fn test_all_bot_game_runs_to_the_end() {
        let registry = registry();
        let seats = vec![
            SeatRequest::Bot { skill: BotSkill::Expert },
            SeatRequest::Bot { skill: BotSkill::Hard },
            SeatRequest::Bot { skill: BotSkill::Medium },
            SeatRequest::Bot { skill: BotSkill::Easy },
        ];
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(30), async {
            while registry.contains(game_id) || registry.pool_size() < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(finished.is_ok(), "bot game should finish");
        assert_eq!(registry.pool_size(), 4);
    }

    #[tokio::test]
    async fn test_bots_take_over_after_human() {
        let registry = registry();
        let human = Uuid::new_v4();
        let mut rx = registry.connect(human);
        let seats = vec![
            SeatRequest::Human {
                player_id: human,
                name: "Ana".into(),
            },
            SeatRequest::Bot { skill: BotSkill::Medium },
            SeatRequest::Bot { skill: BotSkill::Medium },
            SeatRequest::Bot { skill: BotSkill::Medium },
        ];
        let game_id = create_game(&registry, GameConfig::default(), seats).unwrap();

        // The bots play until the human is on turn, then again after the
        // human's move
        let action = wait_for_human(&registry, game_id).await;
        submit(&registry, game_id, human, action).await.unwrap();
        wait_for_human(&registry, game_id).await;

        let msgs = drain(&mut rx);
        assert!(msgs.iter().any(|m| matches!(m, ServerMessage::BidMade { .. })));
        assert!(registry.contains(game_id));
    }
}
