//! Headless scene for replay runs.
//!
//! The RecordingScene stands in for an engine scene:
//! - A fixed set of tracker entities, known up front
//! - The last pose applied to each of them
//! - A count of frames the coordinator has completed

use retrace_env::{EnvError, Pose, PoseSink, TrackerDirectory, TrackerId};
use std::collections::{BTreeMap, BTreeSet};

/// Scene that keeps the latest pose of every tracker entity.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    /// Known entities and their last applied pose (None until first frame)
    entities: BTreeMap<TrackerId, Option<Pose>>,

    /// Completed frames
    frames: u64,

    /// Clock position of the most recent frame
    last_position: Option<f64>,
}

impl RecordingScene {
    /// Creates a scene containing exactly `trackers`.
    pub fn new<I>(trackers: I) -> Self
    where
        I: IntoIterator<Item = TrackerId>,
    {
        Self {
            entities: trackers.into_iter().map(|t| (t, None)).collect(),
            frames: 0,
            last_position: None,
        }
    }

    /// Last pose applied to `tracker`.
    pub fn pose(&self, tracker: &TrackerId) -> Option<&Pose> {
        self.entities.get(tracker).and_then(|p| p.as_ref())
    }

    /// Every tracker that has received a pose, with that pose.
    pub fn poses(&self) -> impl Iterator<Item = (&TrackerId, &Pose)> {
        self.entities
            .iter()
            .filter_map(|(id, pose)| pose.as_ref().map(|p| (id, p)))
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_position(&self) -> Option<f64> {
        self.last_position
    }

    /// Forgets applied poses and frame count; entities stay.
    pub fn clear(&mut self) {
        for pose in self.entities.values_mut() {
            *pose = None;
        }
        self.frames = 0;
        self.last_position = None;
    }
}

impl PoseSink for RecordingScene {
    fn apply_pose(&mut self, tracker: &TrackerId, pose: &Pose) -> Result<(), EnvError> {
        match self.entities.get_mut(tracker) {
            Some(slot) => {
                *slot = Some(*pose);
                Ok(())
            }
            None => Err(EnvError::unavailable(tracker)),
        }
    }

    fn frame_applied(&mut self, position: f64) {
        self.frames += 1;
        self.last_position = Some(position);
    }
}

impl TrackerDirectory for RecordingScene {
    fn available_trackers(&self) -> BTreeSet<TrackerId> {
        self.entities.keys().cloned().collect()
    }

    fn contains_tracker(&self, tracker: &TrackerId) -> bool {
        self.entities.contains_key(tracker)
    }
}
