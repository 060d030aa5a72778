//! Store configuration
//!
//! Configuration loaded from .statehouse.toml.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Store configuration loaded from .statehouse.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Suppress notifications for plain subscriptions when the state did not change
    #[serde(default = "default_auto_skip_repeats")]
    pub auto_skip_repeats: bool,

    /// Install the logging middleware
    #[serde(default = "default_log_actions")]
    pub log_actions: bool,

    /// Log level for the file logger ("error", "warn", "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_auto_skip_repeats() -> bool {
    true
}

fn default_log_actions() -> bool {
    true
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_skip_repeats: default_auto_skip_repeats(),
            log_actions: default_log_actions(),
            log_level: default_log_level(),
        }
    }
}

impl StoreConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::from_toml_str(&content) {
                Ok(config) => {
                    log::info!("Loaded store config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {:#}", e);
                }
            }
        }

        log::debug!("Using default store config");
        Self::default()
    }

    /// Parse a config from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid store configuration")
    }
}
