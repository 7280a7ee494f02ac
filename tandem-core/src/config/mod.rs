pub mod constants;
pub mod types;

pub use types::*;

use crate::core::ConfigError;
use anyhow::{Context, Result};
use std::path::Path;

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// Omitted keys take their defaults from [`constants`]. The result is
    /// validated before it is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();

        let raw = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let cfg = Self::from_toml(&raw)
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        Ok(cfg)
    }

    /// Load from default location (./config/default.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("config/default.toml")
    }

    /// Parse and validate a TOML document
    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(raw).context("Failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.position_limit == 0 {
            return Err(ConfigError::ZeroPositionLimit);
        }

        if self.tick_size == 0 {
            return Err(ConfigError::ZeroTickSize);
        }

        if self.hedge.tolerance >= self.position_limit {
            return Err(ConfigError::ToleranceAboveLimit {
                tolerance: self.hedge.tolerance,
                limit: self.position_limit,
            });
        }

        if self.hedge.max_unhedged_ticks == 0 {
            return Err(ConfigError::ZeroUnhedgedTicks);
        }

        if self.min_bid_tick >= self.max_ask_tick {
            return Err(ConfigError::InvertedPriceBounds {
                min_bid: self.min_bid_tick,
                max_ask: self.max_ask_tick,
            });
        }

        Ok(())
    }
}
