//! Turn timeout monitor.
//!
//! A periodic sweep over every active game. A game whose current seat has
//! been idle longer than the table's timeout is closed outright: humans get
//! `game_timeout` and go back to the lobby, bots go back to the pool.

use crate::protocol::ServerMessage;
use crate::registry::{GameRegistry, Outbox};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct TimeoutMonitor {
    registry: Arc<GameRegistry>,
}

impl TimeoutMonitor {
    pub fn new(registry: Arc<GameRegistry>) -> Self {
        Self { registry }
    }

    /// Run the sweep on the configured tick until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.registry.config.timeout_tick);
            loop {
                ticker.tick().await;
                let expired = self.sweep(Instant::now());
                if expired > 0 {
                    debug!(expired, "Timeout sweep closed games");
                }
            }
        })
    }

    /// Close every game idle past its timeout as of `now`.
    /// Returns how many games this call closed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut closed = 0;

        for (game_id, table) in self.registry.tables() {
            // A busy game is being acted on, so it is not idle
            let Ok(mut guard) = table.try_lock() else {
                continue;
            };
            if !guard.is_expired(now) {
                continue;
            }

            // Removal is the idempotency point; a later tick finds nothing
            if !self.registry.remove(game_id) {
                continue;
            }
            let idle_seat = guard.game.current_player;
            let idle = guard.idle_for(now);
            let humans = self.registry.release_seats(&mut guard);
            drop(guard);

            warn!(%game_id, idle_seat, idle_ms = idle.as_millis() as u64, "Game timed out");
            let outbox: Outbox = humans
                .into_iter()
                .map(|player_id| (player_id, ServerMessage::GameTimeout { game_id, idle_seat }))
                .collect();
            self.registry.deliver(outbox);
            closed += 1;
        }

        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::service::{create_game, leave, SeatRequest};
    use std::time::Duration;
    use twohundred_core::{BotSkill, GameConfig};
    use uuid::Uuid;

    fn config(timeout_ms: u64) -> GameConfig {
        GameConfig {
            timeout_ms,
            ..GameConfig::default()
        }
    }

    #[tokio::test]
    async fn test_timeout_closes_game_once() {
        let registry = Arc::new(GameRegistry::new(ServerConfig::immediate()));
        let human = Uuid::new_v4();
        let mut rx = registry.connect(human);
        let mut seats = vec![SeatRequest::Human {
            player_id: human,
            name: "Ana".into(),
        }];
        for i in 0..3 {
            seats.push(SeatRequest::Human {
                player_id: Uuid::new_v4(),
                name: format!("P{i}"),
            });
        }
        let game_id = create_game(&registry, config(50), seats).unwrap();
        while rx.try_recv().is_ok() {}

        let monitor = TimeoutMonitor::new(Arc::clone(&registry));
        assert_eq!(monitor.sweep(Instant::now()), 0);

        let later = Instant::now() + Duration::from_millis(60);
        assert_eq!(monitor.sweep(later), 1);
        assert!(!registry.contains(game_id));
        assert_eq!(registry.game_of(human), None);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::GameTimeout { game_id: id, .. }) if id == game_id
        ));
        assert!(rx.try_recv().is_err());

        // Second tick on the same game is a no-op
        assert_eq!(monitor.sweep(later), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_timeout_returns_bots_to_pool() {
        let registry = Arc::new(GameRegistry::new(ServerConfig {
            bot_think: Duration::from_secs(3600),
            ..ServerConfig::immediate()
        }));
        let seats = vec![
            SeatRequest::Human {
                player_id: Uuid::new_v4(),
                name: "Ana".into(),
            },
            SeatRequest::Bot { skill: BotSkill::Easy },
            SeatRequest::Bot { skill: BotSkill::Hard },
            SeatRequest::Bot { skill: BotSkill::Expert },
        ];
        let game_id = create_game(&registry, config(1_000), seats).unwrap();

        let monitor = TimeoutMonitor::new(Arc::clone(&registry));
        assert_eq!(monitor.sweep(Instant::now() + Duration::from_secs(2)), 1);
        assert!(!registry.contains(game_id));
        assert_eq!(registry.pool_size(), 3);
    }

    #[tokio::test]
    async fn test_timeout_wins_over_pending_bot_turn() {
        let think = Duration::from_millis(200);
        let registry = Arc::new(GameRegistry::new(ServerConfig {
            bot_think: think,
            ..ServerConfig::immediate()
        }));

        // Deal until a bot opens, so its driver is asleep when the sweep runs
        let (game_id, mut rx) = loop {
            let human = Uuid::new_v4();
            let rx = registry.connect(human);
            let seats = vec![
                SeatRequest::Human {
                    player_id: human,
                    name: "Ana".into(),
                },
                SeatRequest::Bot { skill: BotSkill::Medium },
                SeatRequest::Bot { skill: BotSkill::Hard },
                SeatRequest::Bot { skill: BotSkill::Expert },
            ];
            let game_id = create_game(&registry, config(1_000), seats).unwrap();
            let bot_opens = registry.get(game_id).unwrap().lock().await.is_bot_turn();
            if bot_opens {
                break (game_id, rx);
            }
            leave(&registry, human).await.unwrap();
        };
        let table = registry.get(game_id).unwrap();
        while rx.try_recv().is_ok() {}

        let monitor = TimeoutMonitor::new(Arc::clone(&registry));
        assert_eq!(monitor.sweep(Instant::now() + Duration::from_secs(2)), 1);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::GameTimeout { .. })));

        tokio::time::sleep(think * 3).await;

        assert!(!registry.contains(game_id));
        let guard = table.lock().await;
        assert_eq!(guard.game.round, 1);
        assert_eq!(guard.game.bidding.current, None);
        assert!(guard.game.bidding.passed.is_empty());
        drop(guard);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.pool_size(), 3);
    }

    #[tokio::test]
    async fn test_spawned_monitor_sweeps() {
        let registry = Arc::new(GameRegistry::new(ServerConfig::immediate()));
        let seats = (0..4)
            .map(|i| SeatRequest::Human {
                player_id: Uuid::new_v4(),
                name: format!("P{i}"),
            })
            .collect();
        let game_id = create_game(&registry, config(20), seats).unwrap();

        let handle = TimeoutMonitor::new(Arc::clone(&registry)).spawn();
        let gone = tokio::time::timeout(Duration::from_secs(5), async {
            while registry.contains(game_id) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        handle.abort();
        assert!(gone.is_ok());
    }
}
