// Runtime configuration, read from the environment

use thiserror::Error;

use crate::blockchain::MiningConfig;

/// Errors that can occur while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for the ledger driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address credited with mining rewards
    pub owner_address: String,

    /// Interface the HTTP server binds to
    pub host: String,

    /// Port the HTTP server binds to
    pub port: u16,

    /// Proof-of-work search bounds
    pub mining: MiningConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner_address: "my_blockchain_address".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            mining: MiningConfig::default(),
        }
    }
}

impl Config {
    /// Reads `LEDGER_OWNER_ADDRESS`, `LEDGER_HOST`, `LEDGER_PORT` and
    /// `LEDGER_MAX_ATTEMPTS`, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(owner) = lookup("LEDGER_OWNER_ADDRESS") {
            if owner.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "LEDGER_OWNER_ADDRESS",
                    value: owner,
                });
            }
            config.owner_address = owner;
        }

        if let Some(host) = lookup("LEDGER_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("LEDGER_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LEDGER_PORT",
                value: port.clone(),
            })?;
        }

        if let Some(attempts) = lookup("LEDGER_MAX_ATTEMPTS") {
            let max_attempts = attempts.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LEDGER_MAX_ATTEMPTS",
                value: attempts.clone(),
            })?;
            config.mining.max_attempts = Some(max_attempts);
        }

        Ok(config)
    }
}
