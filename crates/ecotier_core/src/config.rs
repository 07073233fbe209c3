//! Pipeline configuration.
//!
//! # Responsibility
//! - Hold clustering parameters and the tier labeling policy.
//! - Load settings from JSON and apply environment overrides.
//!
//! # Invariants
//! - A config accepted by `validate()` can always drive a clustering run.
//! - Defaults pin the RNG seed; no field is ever derived from ambient entropy.

use crate::pipeline::cluster::KMeansParams;
use crate::pipeline::tiering::TierLabeling;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const ENV_SEED: &str = "ECOTIER_SEED";
pub const ENV_TIER_LABELING: &str = "ECOTIER_TIER_LABELING";

pub const DEFAULT_CLUSTER_COUNT: usize = 3;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_RESTARTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    InvalidValue { field: &'static str, message: String },
    InvalidEnv { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{path}`: {message}")
            }
            Self::Parse(message) => write!(f, "invalid config json: {message}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value for `{field}`: {message}")
            }
            Self::InvalidEnv { key, value } => {
                write!(f, "invalid value `{value}` for environment variable {key}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Tunables for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub cluster_count: usize,
    pub seed: u64,
    pub max_iterations: usize,
    /// Bound on the summed squared centroid shift between iterations.
    pub tolerance: f64,
    /// Number of k-means++ restarts; the lowest-inertia run wins.
    pub restarts: usize,
    pub tier_labeling: TierLabeling,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster_count: DEFAULT_CLUSTER_COUNT,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            restarts: DEFAULT_RESTARTS,
            tier_labeling: TierLabeling::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "clusterCount",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxIterations",
                message: "must be at least 1".to_string(),
            });
        }
        if self.restarts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "restarts",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tolerance",
                message: format!("must be a finite number >= 0, got {}", self.tolerance),
            });
        }
        Ok(())
    }

    /// Applies `ECOTIER_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup. Blank values are skipped.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_SEED) {
            self.seed = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_SEED,
                value: value.clone(),
            })?;
        }
        if let Some(value) = read(ENV_TIER_LABELING) {
            self.tier_labeling =
                TierLabeling::parse(&value).ok_or_else(|| ConfigError::InvalidEnv {
                    key: ENV_TIER_LABELING,
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    pub fn kmeans_params(&self) -> KMeansParams {
        KMeansParams {
            k: self.cluster_count,
            seed: self.seed,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            restarts: self.restarts,
        }
    }
}
