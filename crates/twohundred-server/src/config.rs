//! Server settings read from the environment.

use anyhow::Context;
use std::time::Duration;

/// Pacing and monitoring intervals for the host
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How often the timeout monitor scans the registry
    pub timeout_tick: Duration,
    /// Pause before each bot action
    pub bot_think: Duration,
    /// Pause after a trick completes before a bot leads the next one
    pub trick_pause: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timeout_tick: Duration::from_millis(1000),
            bot_think: Duration::from_millis(800),
            trick_pause: Duration::from_millis(1500),
        }
    }
}

impl ServerConfig {
    /// Read `TIMEOUT_TICK_MS`, `BOT_THINK_MS` and `TRICK_PAUSE_MS`
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            timeout_tick: parse_ms(
                "TIMEOUT_TICK_MS",
                std::env::var("TIMEOUT_TICK_MS").ok(),
                defaults.timeout_tick,
            )?,
            bot_think: parse_ms(
                "BOT_THINK_MS",
                std::env::var("BOT_THINK_MS").ok(),
                defaults.bot_think,
            )?,
            trick_pause: parse_ms(
                "TRICK_PAUSE_MS",
                std::env::var("TRICK_PAUSE_MS").ok(),
                defaults.trick_pause,
            )?,
        })
    }

    /// No pacing at all; the monitor ticks fast
    pub fn immediate() -> Self {
        Self {
            timeout_tick: Duration::from_millis(10),
            bot_think: Duration::ZERO,
            trick_pause: Duration::ZERO,
        }
    }
}

fn parse_ms(key: &str, value: Option<String>, default: Duration) -> anyhow::Result<Duration> {
    match value {
        Some(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("{} must be a number of milliseconds, got {:?}", key, raw)
                })?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}
