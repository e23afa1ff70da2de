//! Viewer configuration: optional YAML file, then environment overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::DEFAULT_TURNS;
use crate::view::{HealthScale, DEFAULT_MAX_HEALTH, LOW_HEALTH_RATIO, LOW_HEALTH_THRESHOLD};

pub const DEFAULT_CONFIG_PATH: &str = "combat-viewer.yaml";
pub const ENV_BASE_URL: &str = "COMBAT_VIEWER_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "COMBAT_VIEWER_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub base_url: String,
    pub default_turns: u32,
    pub request_timeout_ms: u64,
    pub playback_interval_ms: u64,
    pub max_health: f64,
    pub low_health_ratio: f64,
    pub low_health_threshold: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            default_turns: DEFAULT_TURNS,
            request_timeout_ms: 10_000,
            playback_interval_ms: 1_000,
            max_health: DEFAULT_MAX_HEALTH,
            low_health_ratio: LOW_HEALTH_RATIO,
            low_health_threshold: LOW_HEALTH_THRESHOLD,
            canvas_width: 800.0,
            canvas_height: 600.0,
        }
    }
}

impl ViewerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    pub fn health_scale(&self) -> HealthScale {
        HealthScale {
            max_health: self.max_health,
            low_ratio: self.low_health_ratio,
        }
    }

    pub fn from_yaml(input: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validated()
    }

    /// Rejects zero turn counts and durations.
    pub fn validated(self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("default_turns", u64::from(self.default_turns)),
            ("request_timeout_ms", self.request_timeout_ms),
            ("playback_interval_ms", self.playback_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(self)
    }

    /// Read `path` if it exists; a missing file at the default path is not an error.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };
        if !required && !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&raw, path)
    }

    /// Apply environment overrides from `lookup` (usually `std::env::var`).
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.request_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::Env {
                name: ENV_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }
        self.validated()
    }
}
