use std::env;

use dotenvy::dotenv;
use log::debug;

use crate::blockchain::DEFAULT_DIFFICULTY;

pub const DIFFICULTY_VAR: &str = "LEDGER_DIFFICULTY";
pub const MAX_MINING_ATTEMPTS_VAR: &str = "LEDGER_MAX_MINING_ATTEMPTS";

/// Construction-time settings for a [`crate::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Leading zero hex digits required of every mined hash.
    pub difficulty: u32,
    /// Hash budget per block; `None` mines until a nonce is found.
    pub max_mining_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_mining_attempts: None,
        }
    }
}

impl LedgerConfig {
    /// Read settings from the process environment (and `.env`, if present).
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let difficulty = lookup(DIFFICULTY_VAR)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.difficulty);
        let max_mining_attempts = lookup(MAX_MINING_ATTEMPTS_VAR)
            .and_then(|v| v.trim().parse().ok())
            .or(defaults.max_mining_attempts);
        let config = Self {
            difficulty,
            max_mining_attempts,
        };
        debug!("ledger config: {:?}", config);
        config
    }
}
