//! Replay runner - plays trials of a session to completion, headless.

use crate::config::SimConfig;
use crate::context::FrameClock;
use crate::exporter::{ReplayExport, ReplayFrame, TrackerPose, TrialExport};
use crate::scene::RecordingScene;

use retrace_core::{ParticipantSessionTrial, PathCatalog, ReplayCoordinator, Result};
use retrace_env::TrackerId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of playing one trial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial row (1-based)
    pub trial_index: usize,

    /// Trial duration in recording seconds
    pub duration_sec: f64,

    /// Frames in which poses were applied
    pub frames: u64,

    /// Pose applications across all frames
    pub applied: usize,

    /// Tracker-frames left unchanged (lookup or sink failure)
    pub skipped: usize,

    /// Clock position after the last frame
    pub final_position: f64,

    /// Active trackers with no data in this trial
    pub trackers_without_data: Vec<String>,

    /// Why the trial could not be played
    pub failure_reason: Option<String>,
}

impl TrialResult {
    pub fn passed(&self) -> bool {
        self.failure_reason.is_none()
    }
}

/// Results from a replay run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Session the run replayed
    pub resolved: ParticipantSessionTrial,

    /// Trackers driven
    pub trackers: Vec<TrackerId>,

    /// One entry per requested trial, in play order
    pub trials: Vec<TrialResult>,

    /// Every applied frame
    pub export: ReplayExport,
}

impl RunResult {
    /// True if every requested trial played to the end.
    pub fn passed(&self) -> bool {
        self.trials.iter().all(TrialResult::passed)
    }

    pub fn total_frames(&self) -> u64 {
        self.trials.iter().map(|t| t.frames).sum()
    }
}

/// Runs replays against a RecordingScene.
pub struct ReplayRunner {
    config: SimConfig,
}

impl ReplayRunner {
    /// Creates a new replay runner.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Resolves the session, activates trackers and plays the selected trials.
    ///
    /// Fails if the session cannot be resolved or its first trial cannot be
    /// loaded. Later trials that fail to load or play are recorded in their
    /// `TrialResult` and the run moves on.
    pub fn run(&self) -> Result<RunResult> {
        let catalog = PathCatalog::new(&self.config.root);
        let resolved = catalog.resolve(
            self.config.participant.as_deref(),
            self.config.session.as_deref(),
            self.config.trial_file.as_deref(),
        )?;

        let trackers: Vec<TrackerId> = if self.config.trackers.is_empty() {
            let table = PathCatalog::load_table(&resolved)?;
            table
                .tracker_column_names()
                .into_iter()
                .map(TrackerId::new)
                .collect()
        } else {
            self.config.trackers.iter().map(TrackerId::new).collect()
        };
        info!(
            "Replaying {}/{}/{} with {} trackers",
            resolved.participant_id,
            resolved.session_id,
            resolved.trial_file,
            trackers.len()
        );

        let scene = RecordingScene::new(trackers.iter().cloned());
        let mut replay = ReplayCoordinator::new(scene, self.config.replay.clone());
        replay.set_active_trackers(trackers.iter().cloned())?;
        replay.load_trial_set(&resolved)?;

        let trial_count = replay
            .trial_set()
            .map(|set| set.table.trial_count())
            .unwrap_or(0);
        let selected: Vec<usize> = if self.config.all_trials {
            (1..=trial_count).collect()
        } else {
            vec![self.config.trial_index]
        };

        let mut export = ReplayExport::new(
            &resolved.participant_id,
            &resolved.session_id,
            &resolved.trial_file,
            self.config.fps,
            replay.clock().speed(),
        );
        let mut trials = Vec::with_capacity(selected.len());
        let mut clock = FrameClock::new(self.config.fps);

        for index in selected {
            let (result, frames) = self.play_trial(&mut replay, &mut clock, index);
            if let Some(reason) = &result.failure_reason {
                warn!("Trial {} failed: {}", index, reason);
            } else {
                info!(
                    "Trial {} complete: {} frames, {} applied, {} skipped",
                    index, result.frames, result.applied, result.skipped
                );
            }
            export.add_trial(frames);
            trials.push(result);
        }

        Ok(RunResult {
            resolved,
            trackers,
            trials,
            export,
        })
    }

    /// Plays one trial from 0 until the clock pauses at the end.
    ///
    /// The scene and frame clock start empty for every trial, so exported
    /// frames only carry poses from the trial being played.
    fn play_trial(
        &self,
        replay: &mut ReplayCoordinator<RecordingScene>,
        clock: &mut FrameClock,
        index: usize,
    ) -> (TrialResult, TrialExport) {
        let mut result = TrialResult {
            trial_index: index,
            ..Default::default()
        };
        let mut frames = TrialExport::new(index);
        replay.host_mut().clear();
        clock.reset();

        if replay.state().trial_index != Some(index) {
            if let Err(e) = replay.go_to_trial(index) {
                result.failure_reason = Some(e.to_string());
                frames.failure = result.failure_reason.clone();
                return (result, frames);
            }
        }

        result.duration_sec = replay.clock().duration();
        frames.duration_sec = result.duration_sec;
        result.trackers_without_data = replay
            .trackers_without_data()
            .iter()
            .map(|t| t.to_string())
            .collect();

        if let Err(e) = replay.play() {
            result.failure_reason = Some(e.to_string());
            frames.failure = result.failure_reason.clone();
            return (result, frames);
        }

        let frame_limit = frame_limit(result.duration_sec, replay.clock().speed(), clock.dt());

        while replay.clock().is_playing() {
            if clock.frame() >= frame_limit {
                result.failure_reason = Some(format!(
                    "Trial did not finish within {} frames",
                    frame_limit
                ));
                frames.failure = result.failure_reason.clone();
                break;
            }

            let dt = clock.next_frame();
            for phase in clock.phases() {
                let Some(report) = replay.on_frame(phase, dt) else {
                    continue;
                };
                debug!(
                    "Frame {} ({}): position {:.4}, {} applied",
                    clock.frame(),
                    phase,
                    report.position,
                    report.applied
                );

                result.frames += 1;
                result.applied += report.applied;
                result.skipped += report.skipped.len();
                frames.frames.push(ReplayFrame {
                    frame: clock.frame(),
                    time_sec: clock.now().as_secs_f64(),
                    position: report.position,
                    trackers: replay
                        .host()
                        .poses()
                        .map(|(id, pose)| TrackerPose::new(id, pose))
                        .collect(),
                });
            }
        }

        result.final_position = replay.clock().position();
        (result, frames)
    }
}

/// Frames needed to cover a trial at this speed, plus one second of slack.
fn frame_limit(duration: f64, speed: f64, dt: f64) -> u64 {
    let needed = (duration / (speed * dt)).ceil();
    let slack = (1.0 / dt).ceil();
    if needed.is_finite() {
        (needed + slack) as u64
    } else {
        slack as u64
    }
}
