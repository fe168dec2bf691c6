use anyhow::{Context, Result, bail};
use chroma_core::RoomRules;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::registry::RoomSettings;
use crate::websocket::rate_limiter::RateLimitSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub color_catalog_path: Option<String>,
    pub max_rounds: u32,
    pub min_players_to_start: usize,
    pub round_end_countdown_seconds: u32,
    pub guess_time_limit_seconds: u32,
    pub countdown_tick_millis: u64,
    pub rate_limit_max_messages: u32,
    pub rate_limit_refill_millis: u64,
}

impl Config {
    pub fn new() -> Result<Self> {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080)?,
            color_catalog_path: env::var("COLOR_CATALOG_PATH").ok(),
            max_rounds: env_or("MAX_ROUNDS", 5)?,
            min_players_to_start: env_or("MIN_PLAYERS_TO_START", 2)?,
            round_end_countdown_seconds: env_or("ROUND_END_COUNTDOWN_SECONDS", 5)?,
            guess_time_limit_seconds: env_or("GUESS_TIME_LIMIT_SECONDS", 40)?,
            countdown_tick_millis: env_or("COUNTDOWN_TICK_MILLIS", 1000)?,
            rate_limit_max_messages: env_or("RATE_LIMIT_MAX_MESSAGES", 30)?,
            rate_limit_refill_millis: env_or("RATE_LIMIT_REFILL_MILLIS", 500)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            bail!("Invalid MAX_ROUNDS: must be at least 1");
        }
        if self.min_players_to_start < 2 {
            bail!("Invalid MIN_PLAYERS_TO_START: must be at least 2");
        }
        if self.rate_limit_max_messages == 0 {
            bail!("Invalid RATE_LIMIT_MAX_MESSAGES: must be at least 1");
        }
        Ok(())
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            rules: RoomRules {
                max_rounds: self.max_rounds,
                min_players_to_start: self.min_players_to_start,
                guess_time_limit_secs: self.guess_time_limit_seconds,
            },
            countdown_seconds: self.round_end_countdown_seconds,
            countdown_tick: Duration::from_millis(self.countdown_tick_millis),
        }
    }

    pub fn rate_limit(&self) -> RateLimitSettings {
        RateLimitSettings {
            max_messages: self.rate_limit_max_messages,
            refill_every: Duration::from_millis(self.rate_limit_refill_millis),
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => parse_setting(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", name, raw))
}
