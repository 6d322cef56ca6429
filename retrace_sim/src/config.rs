//! Configuration for a headless replay run.

use retrace_core::ReplayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for a replay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Root data directory (`root/{participant}/{session}/{trials}.csv`)
    pub root: PathBuf,

    /// Participant to replay (None = first available)
    pub participant: Option<String>,

    /// Session to replay (None = first available)
    pub session: Option<String>,

    /// Trials file to replay (None = first available)
    pub trial_file: Option<String>,

    /// Scene trackers to drive (empty = one per tracker column)
    pub trackers: Vec<String>,

    /// Trial to play (1-based, default: 1)
    pub trial_index: usize,

    /// Play every trial of the set in order, ignoring `trial_index`
    pub all_trials: bool,

    /// Host frame rate in Hz
    pub fps: u32,

    /// Write every applied frame to this JSON file
    pub export: Option<PathBuf>,

    /// Coordinator settings
    pub replay: ReplayConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            participant: None,
            session: None,
            trial_file: None,
            trackers: Vec::new(),
            trial_index: 1,
            all_trials: false,
            fps: 60,
            export: None,
            replay: ReplayConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
