//! Engine configuration.
//!
//! Loading follows the same shape as `chainflip-engine`'s `Settings::new()`: layered defaults
//! with environment-variable overrides via the `config` crate. Building the
//! full layered source (files, env, CLI flags) is a deployment concern left
//! to the binary that embeds this crate; `EngineConfig::default()` is always
//! available for tests and the bundled CLI.

use config::{Config, ConfigError, Environment};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// If false, `AssetLifecycle::tokenize` bypasses the Tokenization
    /// collaborator and synthesizes an offering id / mint address.
    pub tokenization_enabled: bool,

    /// Minimum bid increment over the current bid, e.g. 0.05 = 5%.
    pub auction_bid_increment_pct: Decimal,

    pub auction_min_duration_seconds: i64,
    pub auction_max_duration_seconds: i64,

    pub scheduler_tick_interval_seconds: u64,
    pub collaborator_timeout_seconds: u64,

    pub pagination_default_limit: u32,
    pub pagination_max_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tokenization_enabled: true,
            auction_bid_increment_pct: dec!(0.05),
            auction_min_duration_seconds: 3600,
            auction_max_duration_seconds: 30 * 24 * 3600,
            scheduler_tick_interval_seconds: 30,
            collaborator_timeout_seconds: 30,
            pagination_default_limit: 20,
            pagination_max_limit: 100,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment, falling back to
    /// [`EngineConfig::default`] for anything unset. Environment variables
    /// are prefixed `RWA_` (e.g. `RWA_TOKENIZATION_ENABLED=false`).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&EngineConfig::default())?;
        let merged = Config::builder()
            .add_source(defaults)
            .add_source(Environment::with_prefix("RWA").separator("_"))
            .build()?;
        merged.try_deserialize()
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_seconds)
    }

    pub fn scheduler_tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_interval_seconds)
    }

    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.pagination_default_limit)
            .min(self.pagination_max_limit)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = EngineConfig::default();
        assert!(config.tokenization_enabled);
        assert_eq!(config.auction_bid_increment_pct, dec!(0.05));
        assert_eq!(config.scheduler_tick_interval_seconds, 30);
        assert_eq!(config.pagination_default_limit, 20);
        assert_eq!(config.pagination_max_limit, 100);
    }

    #[test]
    fn clamp_limit_respects_max() {
        let config = EngineConfig::default();
        assert_eq!(config.clamp_limit(Some(500)), 100);
        assert_eq!(config.clamp_limit(None), 20);
        assert_eq!(config.clamp_limit(Some(0)), 1);
    }
}
