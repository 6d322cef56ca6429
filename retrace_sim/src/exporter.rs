//! JSON exporter for replay runs.
//!
//! Exports every applied frame with the pose of each tracker, for offline
//! inspection or plotting.

use retrace_env::{Pose, TrackerId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single applied frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Host frame number within the trial
    pub frame: u64,

    /// Host time since the trial started playing, in seconds
    pub time_sec: f64,

    /// Normalized playback position the frame was evaluated at
    pub position: f64,

    /// Pose of every tracker that has one
    pub trackers: Vec<TrackerPose>,
}

/// Pose of one tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerPose {
    pub tracker: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
    pub qw: f64,
}

impl TrackerPose {
    pub fn new(tracker: &TrackerId, pose: &Pose) -> Self {
        let q = pose.rotation.quaternion();
        Self {
            tracker: tracker.to_string(),
            x: pose.position.x,
            y: pose.position.y,
            z: pose.position.z,
            qx: q.i,
            qy: q.j,
            qz: q.k,
            qw: q.w,
        }
    }
}

/// Frames of one played trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialExport {
    /// Trial row (1-based)
    pub trial_index: usize,

    /// Trial duration in recording seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<ReplayFrame>,

    /// Why the trial could not be played
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl TrialExport {
    pub fn new(trial_index: usize) -> Self {
        Self {
            trial_index,
            duration_sec: 0.0,
            frames: Vec::new(),
            failure: None,
        }
    }
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayExport {
    pub participant: String,
    pub session: String,
    pub trial_file: String,

    /// Host frame rate used
    pub fps: u32,

    /// Playback speed multiplier used
    pub speed_multiplier: f64,

    /// Played trials, in order
    pub trials: Vec<TrialExport>,
}

impl ReplayExport {
    /// Creates a new export container.
    pub fn new(
        participant: &str,
        session: &str,
        trial_file: &str,
        fps: u32,
        speed_multiplier: f64,
    ) -> Self {
        Self {
            participant: participant.to_string(),
            session: session.to_string(),
            trial_file: trial_file.to_string(),
            fps,
            speed_multiplier,
            trials: Vec::new(),
        }
    }

    /// Adds a trial.
    pub fn add_trial(&mut self, trial: TrialExport) {
        self.trials.push(trial);
    }

    /// Total frames across all trials.
    pub fn frame_count(&self) -> usize {
        self.trials.iter().map(|t| t.frames.len()).sum()
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
