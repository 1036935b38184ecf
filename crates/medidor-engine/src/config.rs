//! Engine configuration: TOML load/save and application to a controller.

use std::path::{Path, PathBuf};

use medidor_analysis::{MAX_FFT_ORDER, MIN_FFT_ORDER};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::controller::{AnalysisController, DEFAULT_FFT_ORDER};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Recognized engine options.
///
/// Anything the file does not mention keeps its default. `fft_order` is
/// log2 of the analysis window; values outside 8..=15 are ignored when
/// applied, matching the engine's clamped-input policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Audio block size in frames.
    pub buffer_size: usize,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Analysis FFT order, valid range 8..=15.
    pub fft_order: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 512,
            sample_rate: 44100.0,
            fft_order: DEFAULT_FFT_ORDER,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Save the config to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml()?;
        std::fs::write(path, text).map_err(|source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply these options to a controller.
    ///
    /// Re-prepares the controller for the configured rate and block size.
    /// An out-of-range `fft_order` is logged and ignored; the controller's
    /// current order stands.
    pub fn apply_to(&self, controller: &mut AnalysisController) {
        controller.prepare(self.sample_rate, self.buffer_size);

        if (MIN_FFT_ORDER..=MAX_FFT_ORDER).contains(&self.fft_order) {
            controller.set_order(self.fft_order);
        } else {
            warn!(
                fft_order = self.fft_order,
                "ignoring fft_order outside {MIN_FFT_ORDER}..={MAX_FFT_ORDER}"
            );
        }
    }
}
