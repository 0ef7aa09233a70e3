//! Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::anomaly::DEFAULT_SENSITIVITY;
use crate::data::{ScanMode, ScanProfile};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Outlier model constants.
    #[serde(default)]
    pub model: ModelConfig,
    /// Scan windows and defaults.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Outlier model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Trees per forest.
    pub n_estimators: usize,
    /// Seed for tree construction.
    pub seed: u64,
    /// Upper bound on rows drawn per tree.
    pub max_samples: usize,
    /// Fewer feature rows than this skip fitting entirely.
    pub min_samples: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_samples: 256,
            min_samples: 10,
        }
    }
}

/// Scan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Sensitivity when the caller gives none (0-100).
    pub default_sensitivity: i32,
    /// Short window, fine granularity.
    pub live: ScanProfile,
    /// Long window, coarse granularity.
    pub deep: ScanProfile,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_sensitivity: DEFAULT_SENSITIVITY,
            live: ScanProfile::live(),
            deep: ScanProfile::deep(),
        }
    }
}

impl ScanConfig {
    /// Retrieval window for a scan mode; explain reuses the live window.
    pub fn profile(&self, mode: ScanMode) -> &ScanProfile {
        match mode {
            ScanMode::Live | ScanMode::Explain => &self.live,
            ScanMode::Deep => &self.deep,
        }
    }
}

impl Config {
    /// Create a new configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Create a sample configuration file.
    pub fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Config::default().save_to_file(path)
    }

    /// Reject settings the model cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.model.n_estimators == 0 {
            anyhow::bail!("model.n_estimators must be at least 1");
        }
        if self.model.max_samples == 0 {
            anyhow::bail!("model.max_samples must be at least 1");
        }
        if !(0..=100).contains(&self.scan.default_sensitivity) {
            anyhow::bail!(
                "scan.default_sensitivity must be within 0-100, got {}",
                self.scan.default_sensitivity
            );
        }
        Ok(())
    }
}

/// Load configuration from file or create default.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}
