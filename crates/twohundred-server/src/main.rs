//! 200 game server.
//!
//! Starts the registry and timeout monitor, then plays an all-bot exhibition
//! table to completion.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twohundred_core::{BotSkill, GameConfig};
use twohundred_server::service::{self, SeatRequest};
use twohundred_server::{GameRegistry, ServerConfig, TimeoutMonitor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(?config, "Starting 200 server...");

    let registry = Arc::new(GameRegistry::new(config));
    let monitor = TimeoutMonitor::new(Arc::clone(&registry)).spawn();

    let seats = [BotSkill::Expert, BotSkill::Hard, BotSkill::Expert, BotSkill::Medium]
        .into_iter()
        .map(|skill| SeatRequest::Bot { skill })
        .collect();
    let game_id = service::create_game(&registry, GameConfig::default(), seats)?;
    info!(%game_id, "Exhibition table seated");

    let tick = registry.config.timeout_tick;
    tokio::select! {
        _ = async {
            while registry.contains(game_id) {
                tokio::time::sleep(tick).await;
            }
        } => info!(%game_id, bots_in_pool = registry.pool_size(), "Exhibition finished"),
        _ = tokio::signal::ctrl_c() => warn!("Interrupted, shutting down"),
    }

    monitor.abort();
    Ok(())
}
