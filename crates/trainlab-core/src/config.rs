//! Workbench configuration.
//!
//! Settings come from an optional TOML file, then `TRAINLAB_*` environment
//! variables override individual values.
//!
//! ```toml
//! seed_sample_data = true
//!
//! [store]
//! latency_ms = 300
//!
//! [simulation]
//! tick_interval_ms = 500
//! grace_period_ms = 1000
//! history_len = 20
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use trainlab_training::SimulationSettings;

pub const ENV_STORE_LATENCY_MS: &str = "TRAINLAB_STORE_LATENCY_MS";
pub const ENV_TICK_INTERVAL_MS: &str = "TRAINLAB_TICK_INTERVAL_MS";
pub const ENV_GRACE_PERIOD_MS: &str = "TRAINLAB_GRACE_PERIOD_MS";
pub const ENV_HISTORY_LEN: &str = "TRAINLAB_HISTORY_LEN";
pub const ENV_SEED: &str = "TRAINLAB_SEED";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Store behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Artificial delay applied to every store call.
    #[serde(default)]
    pub latency_ms: u64,
}

/// Training simulation cadence and randomness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Fixed seed for reproducible runs; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_grace_period_ms() -> u64 {
    1000
}

fn default_history_len() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            grace_period_ms: default_grace_period_ms(),
            history_len: default_history_len(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Seed the sample dataset on `init`.
    #[serde(default = "default_true")]
    pub seed_sample_data: bool,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            simulation: SimulationConfig::default(),
            seed_sample_data: true,
        }
    }
}

impl WorkbenchConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// File (if any), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from `lookup`, typically `std::env::var`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_STORE_LATENCY_MS)? {
            self.store.latency_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_TICK_INTERVAL_MS)? {
            self.simulation.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_GRACE_PERIOD_MS)? {
            self.simulation.grace_period_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_HISTORY_LEN)? {
            self.simulation.history_len = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SEED)? {
            self.simulation.seed = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.simulation_settings()
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    #[must_use]
    pub fn store_latency(&self) -> Duration {
        Duration::from_millis(self.store.latency_ms)
    }

    #[must_use]
    pub fn simulation_settings(&self) -> SimulationSettings {
        SimulationSettings {
            tick_interval: Duration::from_millis(self.simulation.tick_interval_ms),
            grace_period: Duration::from_millis(self.simulation.grace_period_ms),
            history_len: self.simulation.history_len,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("{key}={raw}: {e}"))),
    }
}
