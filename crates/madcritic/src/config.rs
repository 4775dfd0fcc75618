//! Project configuration file support for madcritic.
//!
//! Loads configuration from `madcritic.toml` in the working directory, or
//! from an explicit `--config` path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use madcritic_core::DebateConfig;
use madcritic_eval::EvalSettings;
use madcritic_oracle::OracleSettings;

/// Project-level configuration loaded from `madcritic.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub debate: DebateConfig,
    /// Oracle used by reasoning agents
    #[serde(default)]
    pub oracle: OracleSettings,
    /// Oracle used by the critic; falls back to `[oracle]`
    #[serde(default)]
    pub critic_oracle: Option<OracleSettings>,
    #[serde(default)]
    pub eval: EvalSettings,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "madcritic.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(None);
        }
        Self::load_file(&config_path).map(Some)
    }

    /// Load an explicitly named config file; a missing file is an error.
    pub fn load_file(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Settings for the critic oracle.
    /// Priority: [critic_oracle] > [oracle]
    pub fn critic_oracle(&self) -> &OracleSettings {
        self.critic_oracle.as_ref().unwrap_or(&self.oracle)
    }
}
