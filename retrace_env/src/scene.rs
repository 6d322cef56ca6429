//! Scene-side interfaces consumed by the replay coordinator.

use crate::error::EnvError;
use crate::types::{Pose, TrackerId};
use std::collections::BTreeSet;

/// Receives resolved poses and applies them to scene entities.
///
/// # Implementations
///
/// - **Engine host**: writes the pose into the entity's transform
/// - **Headless**: `RecordingScene` in `retrace_sim` keeps the last pose
pub trait PoseSink {
    /// Applies a pose to the entity driven by `tracker`.
    ///
    /// # Returns
    /// * `Ok(())` - The pose was applied
    /// * `Err(EnvError)` - The entity could not take the pose this frame
    fn apply_pose(&mut self, tracker: &TrackerId, pose: &Pose) -> Result<(), EnvError>;

    /// Called once after every active tracker has been evaluated for a frame.
    fn frame_applied(&mut self, _position: f64) {}
}

/// Lists the trackers the host scene currently knows about.
pub trait TrackerDirectory {
    /// Returns every tracker identity present in the scene.
    fn available_trackers(&self) -> BTreeSet<TrackerId>;

    /// Returns true if `tracker` is present in the scene.
    fn contains_tracker(&self, tracker: &TrackerId) -> bool {
        self.available_trackers().contains(tracker)
    }
}

/// Everything the coordinator needs from its host.
pub trait ReplayHost: PoseSink + TrackerDirectory {}

impl<T: PoseSink + TrackerDirectory> ReplayHost for T {}
