//! Configuration management for buildpulse
//!
//! Repository-level settings for metric emission: name prefix, global tags,
//! sink endpoint, and filter thresholds. Loaded from `buildpulse.toml` in the
//! repo root.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{PulseError, Result};

/// Repository-level buildpulse configuration
///
/// Loaded from `buildpulse.toml` in the repo root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Prefix prepended to every emitted metric name
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Tags attached to every emitted metric
    #[serde(default)]
    pub global_tags: Vec<String>,

    /// Sink endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable containing the sink API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Emit per-entry transitive dependency tree metrics (verbose)
    #[serde(default)]
    pub keep_tree_metrics: bool,

    /// Filter thresholds
    #[serde(default)]
    pub thresholds: FilterThresholds,
}

/// Minimum values a metric must reach to survive the threshold filter
///
/// A value equal to the threshold survives; only values strictly below are
/// dropped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterThresholds {
    /// Minimum for count metrics
    #[serde(default = "default_count_threshold")]
    pub count: f64,

    /// Minimum for size metrics, in bytes
    #[serde(default = "default_size_threshold")]
    pub size: f64,

    /// Minimum for duration metrics, in milliseconds
    #[serde(default = "default_duration_threshold")]
    pub duration: f64,
}

// Default value providers
fn default_prefix() -> String {
    "buildpulse".to_string()
}

fn default_endpoint() -> String {
    "https://app.buildpulse.dev/api/v1/series".to_string()
}

fn default_api_key_env() -> String {
    "BUILDPULSE_API_KEY".to_string()
}

fn default_count_threshold() -> f64 {
    10.0
}

fn default_size_threshold() -> f64 {
    10_000.0
}

fn default_duration_threshold() -> f64 {
    10.0
}

impl PulseConfig {
    /// Load configuration from `buildpulse.toml` or use defaults
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join("buildpulse.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| PulseError::Config(format!("Failed to parse config file: {}", e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `buildpulse.toml`
    pub fn write_default(repo_root: &Path) -> Result<()> {
        let config_path = repo_root.join("buildpulse.toml");
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| PulseError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            global_tags: Vec::new(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            keep_tree_metrics: false,
            thresholds: FilterThresholds::default(),
        }
    }
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            count: default_count_threshold(),
            size: default_size_threshold(),
            duration: default_duration_threshold(),
        }
    }
}
