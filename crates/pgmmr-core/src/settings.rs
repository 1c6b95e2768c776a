//! Beam-search settings loaded from TOML.
//!
//! - `parse_settings_toml(toml)` parses and validates a `BeamConfig`
//! - `default_config()` returns the embedded defaults
//! - Default values are embedded via `include_str!("default_settings.toml")`
//!
//! There is no global instance: the resulting `BeamConfig` is passed to
//! `run_beam_search` explicitly.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::mmr::{MuteK, SourceGate};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid value for {field}: {reason}")]
pub struct ConfigError {
    pub field: String,
    pub reason: String,
}

impl ConfigError {
    pub(crate) fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeamConfig {
    #[serde(rename = "beam")]
    pub search: SearchConfig,
    pub diversity: DiversityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchConfig {
    pub beam_width: usize,
    pub max_decode_steps: usize,
    pub min_decode_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiversityConfig {
    pub enabled: bool,
    pub lambda: f32,
    pub mute_k: MuteK,
    pub retain_values: bool,
}

impl DiversityConfig {
    pub fn gate(&self) -> SourceGate {
        SourceGate {
            mute_k: self.mute_k,
            retain_values: self.retain_values,
        }
    }
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                beam_width: 4,
                max_decode_steps: 120,
                min_decode_steps: 35,
            },
            diversity: DiversityConfig {
                enabled: true,
                lambda: 0.6,
                mute_k: MuteK::TopK(7),
                retain_values: false,
            },
        }
    }
}

impl BeamConfig {
    pub fn beam_width(&self) -> usize {
        self.search.beam_width
    }

    /// Check the invariants the search relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.search;
        if s.beam_width < 1 {
            return Err(ConfigError::new("beam.beam_width", "must be positive"));
        }
        if s.max_decode_steps < 1 {
            return Err(ConfigError::new("beam.max_decode_steps", "must be positive"));
        }
        if s.min_decode_steps > s.max_decode_steps {
            return Err(ConfigError::new(
                "beam.min_decode_steps",
                format!(
                    "must not exceed max_decode_steps ({})",
                    s.max_decode_steps
                ),
            ));
        }
        let lambda = self.diversity.lambda;
        if !(0.0..=1.0).contains(&lambda) {
            return Err(ConfigError::new(
                "diversity.lambda",
                format!("must be within [0, 1], got {lambda}"),
            ));
        }
        Ok(())
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<BeamConfig, SettingsError> {
    let config: BeamConfig =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

pub fn load_settings(path: &Path) -> Result<BeamConfig, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings_toml(&content)
}

/// The embedded defaults, parsed.
pub fn default_config() -> BeamConfig {
    parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap_or_default()
}
