//! Configuration
//!
//! Loaded from an optional TOML file with `JOURNAL_`-prefixed environment
//! overrides. Every field has a default, so an empty file (or none at all)
//! yields a working configuration.

use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::Duration;

/// Cache TTLs used for staleness gating by the loader
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Trade journal TTL in seconds (default: 300 = 5 min)
    pub trades_ttl_secs: u64,
    /// Macro series TTL in seconds (default: 3600 = 1 h)
    pub macro_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            trades_ttl_secs: 300,
            macro_ttl_secs: 3_600,
        }
    }
}

impl CacheConfig {
    pub fn trades_ttl(&self) -> Duration {
        Duration::from_secs(self.trades_ttl_secs)
    }

    pub fn macro_ttl(&self) -> Duration {
        Duration::from_secs(self.macro_ttl_secs)
    }
}

/// Loader behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Upper bound on trade pages per load, guards runaway cursor chains
    pub max_pages: usize,
    /// Per-request timeout in seconds (default: 14)
    pub fetch_timeout_secs: u64,
    /// Macro series identifiers fetched on refresh
    pub macro_series: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_pages: 30,
            fetch_timeout_secs: 14,
            macro_series: ["CPIAUCSL", "CPILFESL", "PAYEMS", "UNRATE", "FEDFUNDS"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl LoaderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Monte Carlo behavior constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Equity floor in R at which a run counts as ruined (default: -20)
    pub ruin_threshold_r: Decimal,
    /// Reported percentiles, percent values in (0, 100)
    pub percentiles: Vec<u8>,
    /// Runs per simulation when the request does not specify one
    pub default_runs: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ruin_threshold_r: dec!(-20),
            percentiles: vec![10, 25, 50, 75, 90],
            default_runs: 500,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Load from a TOML file (missing file is fine) plus environment
    /// variables like `JOURNAL_CACHE__TRADES_TTL_SECS=60`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("JOURNAL").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
