//! Tuning for session batch sizes and the windowed estimator.
//!
//! Environment variables:
//! - `PAGINATED_RANGE_FACTOR`: upper bound multiplier for `fetch(n)`
//! - `PAGINATED_PESSIMISM_LOW`: over-fetch multiplier for the estimator's lower bound
//! - `PAGINATED_PESSIMISM_HIGH`: multiplier applied on top of that for the upper bound
//! - `PAGINATED_MAX_BATCHES`: upstream pulls a single fetch should need at worst
//!
//! The defaults are empirical. They bias toward slightly over-fetching
//! rather than paying for extra round trips.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default multiplier deriving `at_most` from `at_least`.
pub const DEFAULT_RANGE_FACTOR: f64 = 2.0;

/// 20% more input than the observed ratio says we need.
pub const DEFAULT_PESSIMISM_LOW: f64 = 1.2;

/// A further 50% on top of the lower bound.
pub const DEFAULT_PESSIMISM_HIGH: f64 = 1.5;

/// Floor each upstream pull at `at_least / max_batches`.
pub const DEFAULT_MAX_BATCHES: usize = 10;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: String, value: String },

    #[error("Invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Heuristics used by [`Paginated::map_windowed_with`](crate::Paginated::map_windowed_with).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_pessimism_low")]
    pub pessimism_low: f64,

    #[serde(default = "default_pessimism_high")]
    pub pessimism_high: f64,

    /// Caps how thinly one downstream fetch can be spread over upstream pulls.
    #[serde(default = "default_max_batches")]
    pub max_batches: usize,
}

fn default_pessimism_low() -> f64 {
    DEFAULT_PESSIMISM_LOW
}

fn default_pessimism_high() -> f64 {
    DEFAULT_PESSIMISM_HIGH
}

fn default_max_batches() -> usize {
    DEFAULT_MAX_BATCHES
}

fn default_range_factor() -> f64 {
    DEFAULT_RANGE_FACTOR
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pessimism_low: DEFAULT_PESSIMISM_LOW,
            pessimism_high: DEFAULT_PESSIMISM_HIGH,
            max_batches: DEFAULT_MAX_BATCHES,
        }
    }
}

impl WindowConfig {
    /// Smallest lower bound the estimator will ever ask upstream for.
    pub fn floor_for(&self, at_least: usize) -> usize {
        at_least.div_ceil(self.max_batches.max(1)).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pessimism_low.is_nan() || self.pessimism_low <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "pessimism_low",
                message: format!("must be positive, got {}", self.pessimism_low),
            });
        }
        if self.pessimism_high.is_nan() || self.pessimism_high < 1.0 {
            return Err(ConfigError::Invalid {
                field: "pessimism_high",
                message: format!("must be at least 1.0, got {}", self.pessimism_high),
            });
        }
        if self.max_batches == 0 {
            return Err(ConfigError::Invalid {
                field: "max_batches",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Session-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaginatedConfig {
    /// `fetch(n)` may return up to `n * range_factor` elements.
    #[serde(default = "default_range_factor")]
    pub range_factor: f64,

    #[serde(default)]
    pub window: WindowConfig,
}

impl Default for PaginatedConfig {
    fn default() -> Self {
        Self {
            range_factor: DEFAULT_RANGE_FACTOR,
            window: WindowConfig::default(),
        }
    }
}

impl PaginatedConfig {
    /// Load from `PAGINATED_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "PAGINATED_RANGE_FACTOR")? {
            config.range_factor = v;
        }
        if let Some(v) = parse_var(&lookup, "PAGINATED_PESSIMISM_LOW")? {
            config.window.pessimism_low = v;
        }
        if let Some(v) = parse_var(&lookup, "PAGINATED_PESSIMISM_HIGH")? {
            config.window.pessimism_high = v;
        }
        if let Some(v) = parse_var(&lookup, "PAGINATED_MAX_BATCHES")? {
            config.window.max_batches = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[paginated]` section:
    /// ```toml
    /// [paginated]
    /// range_factor = 2.0
    ///
    /// [paginated.window]
    /// pessimism_low = 1.2
    /// pessimism_high = 1.5
    /// max_batches = 10
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        match Self::from_toml_str(&contents)? {
            Some(config) => Ok(config),
            None => Self::from_env(),
        }
    }

    /// Parse the `[paginated]` section of a TOML document, if it has one.
    pub fn from_toml_str(contents: &str) -> Result<Option<Self>, ConfigError> {
        let table: toml::Table =
            contents
                .parse()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    message: e.to_string(),
                })?;

        let Some(section) = table.get("paginated") else {
            return Ok(None);
        };

        let config: PaginatedConfig =
            section
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    message: e.to_string(),
                })?;

        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range_factor.is_nan() || self.range_factor < 1.0 {
            return Err(ConfigError::Invalid {
                field: "range_factor",
                message: format!("must be at least 1.0, got {}", self.range_factor),
            });
        }
        self.window.validate()
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env {
                var: var.to_string(),
                value,
            }),
    }
}
