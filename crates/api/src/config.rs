//! Application configuration loaded from environment variables.

use chrono::TimeDelta;
use domain::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TOKEN_TTL_HOURS, FeeDefaults, Money};
use reservation::EngineSettings;
use thiserror::Error;

/// Longest token lifetime accepted from the environment.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {0}")]
    TokenTtl(i64),

    #[error("{name} must not be negative, got {value}")]
    NegativeAmount { name: &'static str, value: i64 },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DEFAULT_HOURLY_RATE_CENTS`: rate until a fee policy is recorded (default `1000`)
/// - `DEFAULT_PENALTY_CENTS`: overstay penalty until a fee policy is recorded (default `5000`)
/// - `TOKEN_TTL_HOURS`: token lifetime (default `24`)
/// - `COMMAND_MAX_ATTEMPTS`: attempts per contended write (default `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub default_hourly_rate_cents: i64,
    pub default_penalty_cents: i64,
    pub token_ttl_hours: i64,
    pub command_max_attempts: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            default_hourly_rate_cents: env_parse("DEFAULT_HOURLY_RATE_CENTS")
                .unwrap_or(defaults.default_hourly_rate_cents),
            default_penalty_cents: env_parse("DEFAULT_PENALTY_CENTS")
                .unwrap_or(defaults.default_penalty_cents),
            token_ttl_hours: env_parse("TOKEN_TTL_HOURS").unwrap_or(defaults.token_ttl_hours),
            command_max_attempts: env_parse("COMMAND_MAX_ATTEMPTS")
                .unwrap_or(defaults.command_max_attempts),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Engine settings for this configuration, rejecting values the engine
    /// cannot work with.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let token_ttl = Some(self.token_ttl_hours)
            .filter(|hours| (1..=MAX_TOKEN_TTL_HOURS).contains(hours))
            .and_then(TimeDelta::try_hours)
            .ok_or(ConfigError::TokenTtl(self.token_ttl_hours))?;

        Ok(EngineSettings {
            fee_defaults: FeeDefaults {
                hourly_rate: non_negative("DEFAULT_HOURLY_RATE_CENTS", self.default_hourly_rate_cents)?,
                penalty: non_negative("DEFAULT_PENALTY_CENTS", self.default_penalty_cents)?,
            },
            token_ttl,
            max_attempts: self.command_max_attempts,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            default_hourly_rate_cents: 1000,
            default_penalty_cents: 5000,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            command_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<Money, ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeAmount { name, value });
    }
    Ok(Money::from_cents(value))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
