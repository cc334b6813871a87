use chrono::Duration;
use referral_shared::invite_store::{
    InviteTokenSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_SWEEP_INTERVAL_MINUTES,
    DEFAULT_TOKEN_ALPHABET, DEFAULT_TOKEN_LENGTH, DEFAULT_TOKEN_TTL_HOURS,
};
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    /// Route prefix, `/Prod` unless REMOVE_BASE_PATH is true
    pub prefix: String,
    pub invite: InviteTokenSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let remove_base_path = lookup("REMOVE_BASE_PATH")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        let prefix = if remove_base_path { "" } else { "/Prod" };

        let ttl_hours: i64 = parse_or(&lookup, "INVITE_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        let sweep_minutes: u64 = parse_or(
            &lookup,
            "INVITE_SWEEP_INTERVAL_MINUTES",
            DEFAULT_SWEEP_INTERVAL_MINUTES,
        )?;
        let lifetime = Duration::try_hours(ttl_hours)
            .filter(|lifetime| *lifetime > Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                key: "INVITE_TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;
        let sweep_secs = sweep_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Invalid {
                key: "INVITE_SWEEP_INTERVAL_MINUTES",
                value: sweep_minutes.to_string(),
            })?;
        let alphabet = lookup("INVITE_TOKEN_ALPHABET")
            .unwrap_or_else(|| DEFAULT_TOKEN_ALPHABET.to_string());

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            jwt_secret,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            prefix: prefix.to_string(),
            invite: InviteTokenSettings {
                lifetime,
                sweep_interval: std::time::Duration::from_secs(sweep_secs),
                alphabet: alphabet.chars().collect(),
                length: parse_or(&lookup, "INVITE_TOKEN_LENGTH", DEFAULT_TOKEN_LENGTH)?,
                max_attempts: parse_or(&lookup, "INVITE_TOKEN_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
