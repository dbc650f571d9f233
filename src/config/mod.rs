use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::consensus::ValidationPolicy;

pub const DEFAULT_PARTICIPANTS: usize = 4;
pub const DEFAULT_TARGET_LENGTH: usize = 20;
pub const DEFAULT_INITIAL_DIFFICULTY: u32 = 3;
/// Target milliseconds between blocks.
pub const DEFAULT_MINE_RATE_MS: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("participant count must be at least 1")]
    NoParticipants,
    #[error("target chain length must be at least 1")]
    ZeroTargetLength,
    #[error("initial difficulty must be at least 1")]
    ZeroDifficulty,
    #[error("target block interval must be positive")]
    NonPositiveInterval,
    #[error("invalid participant count argument {0:?}")]
    BadParticipantArg(String),
}

/// Fixed parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub participants: usize,
    pub target_length: usize,
    pub initial_difficulty: u32,
    pub target_interval_ms: i64,
    pub validation: ValidationPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            participants: DEFAULT_PARTICIPANTS,
            target_length: DEFAULT_TARGET_LENGTH,
            initial_difficulty: DEFAULT_INITIAL_DIFFICULTY,
            target_interval_ms: DEFAULT_MINE_RATE_MS,
            validation: ValidationPolicy::Linkage,
        }
    }
}

impl SimConfig {
    /// Read the process environment (call `dotenvy::dotenv()` first to pick up `.env`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparsable values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let verify_pow = lookup("VERIFY_POW")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            participants: parse_or(&lookup, "PARTICIPANTS", d.participants),
            target_length: parse_or(&lookup, "TARGET_LENGTH", d.target_length),
            initial_difficulty: parse_or(&lookup, "INITIAL_DIFFICULTY", d.initial_difficulty),
            target_interval_ms: parse_or(&lookup, "MINE_RATE_MS", d.target_interval_ms),
            validation: if verify_pow {
                ValidationPolicy::ProofOfWork
            } else {
                ValidationPolicy::Linkage
            },
        }
    }

    /// Apply the optional positional participant-count argument.
    pub fn with_participant_arg(mut self, arg: Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = arg {
            self.participants = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::BadParticipantArg(raw.clone()))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants == 0 {
            return Err(ConfigError::NoParticipants);
        }
        if self.target_length == 0 {
            return Err(ConfigError::ZeroTargetLength);
        }
        if self.initial_difficulty == 0 {
            return Err(ConfigError::ZeroDifficulty);
        }
        if self.target_interval_ms <= 0 {
            return Err(ConfigError::NonPositiveInterval);
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
