//! Configuration for tag query compilation
//!
//! Loaded once at process start from TOML, with environment variable
//! overrides and sensible defaults. The values are passed explicitly into
//! filter construction; nothing here is global state.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Environment variable overriding [`TagQueryConfig::match_cache_size`]
pub const MATCH_CACHE_SIZE_ENV: &str = "TAGQUERY_MATCH_CACHE_SIZE";

/// Upper bound accepted for the per-filter match cache
const MAX_MATCH_CACHE_SIZE: usize = 10_000_000;

/// Tag query configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagQueryConfig {
    /// Maximum entries in each of the matched/missed maps of a regex
    /// filter's match cache (0 disables caching)
    #[serde(default = "default_match_cache_size")]
    pub match_cache_size: usize,
}

fn default_match_cache_size() -> usize { 1000 }

impl Default for TagQueryConfig {
    fn default() -> Self {
        Self {
            match_cache_size: default_match_cache_size(),
        }
    }
}

impl TagQueryConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var(MATCH_CACHE_SIZE_ENV) {
            match size.parse() {
                Ok(s) => self.match_cache_size = s,
                Err(e) => warn!(
                    value = %size,
                    error = %e,
                    "ignoring invalid {}", MATCH_CACHE_SIZE_ENV
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.match_cache_size > MAX_MATCH_CACHE_SIZE {
            return Err(Error::Configuration(format!(
                "match_cache_size {} exceeds maximum of {}",
                self.match_cache_size, MAX_MATCH_CACHE_SIZE
            )));
        }
        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents).map_err(|e| {
            Error::Configuration(format!("Failed to write config file {}: {}", path, e))
        })
    }
}
