//! Replay configuration.

use retrace_env::TickPhase;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Slowest allowed playback speed multiplier.
pub const MIN_SPEED: f64 = 1.0;

/// Fastest allowed playback speed multiplier.
pub const MAX_SPEED: f64 = 2.0;

/// Configuration for the ReplayCoordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Playback speed multiplier, clamped to [1, 2] (default: 1.0)
    pub speed_multiplier: f64,

    /// Host phase the coordinator advances in (default: Tick)
    pub tick_phase: TickPhase,

    /// Directory tracker paths in the trial table are relative to
    /// (default: None = the resolved session directory)
    pub data_root: Option<PathBuf>,

    /// Reject tracker names matching several columns instead of taking
    /// the first (default: true)
    pub require_unique_tracker_match: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            tick_phase: TickPhase::Tick,
            data_root: None,
            require_unique_tracker_match: true,
        }
    }
}
