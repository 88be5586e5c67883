//! Runtime configuration.
//!
//! Loaded from environment variables; command-line flags override them.

use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_PATH: &str = "accounts.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Accounts file read at start and rewritten after every mutation
    pub data_path: PathBuf,

    /// Clear the terminal before each menu
    pub clear_screen: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_path = env::var("BANK_LEDGER_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        let clear_screen = match env::var("BANK_LEDGER_CLEAR_SCREEN") {
            Ok(value) => parse_flag(&value)
                .ok_or(ConfigError::InvalidValue("BANK_LEDGER_CLEAR_SCREEN"))?,
            Err(_) => true,
        };

        Ok(Self {
            data_path,
            clear_screen,
        })
    }

    pub fn with_data_path(mut self, data_path: Option<PathBuf>) -> Self {
        if let Some(path) = data_path {
            self.data_path = path;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            clear_screen: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
