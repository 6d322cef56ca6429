//! The "REPLAY" Coordinator - trials, trackers and the clock in one place
//!
//! This module ties the pipeline together:
//! 1. Trial set: the parsed trial table plus the directory its paths are relative to
//! 2. Activation: an explicit, validated set of scene trackers to drive
//! 3. Trial load: per-tracker file resolution and series (re)build, all-or-nothing
//! 4. Frames: one clock position per tick, applied to every active tracker
//!
//! All file I/O happens in trial loads. Ticks and seeks only read memory.

use crate::catalog::{ParticipantSessionTrial, PathCatalog};
use crate::config::ReplayConfig;
use crate::error::{LookupError, Result};
use crate::playback::{PlaybackClock, PlaybackState};
use crate::trial_table::TrialTable;
use crate::tracker_series::TrackerTimeSeries;
use retrace_env::{ReplayHost, TickPhase, TrackerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loaded trial table and where its tracker paths point.
#[derive(Debug, Clone)]
pub struct TrialSet {
    /// Parsed trial table
    pub table: TrialTable,

    /// Directory tracker paths in the table are relative to
    pub data_root: PathBuf,

    /// The resolved triple the table came from, if loaded from a catalog
    pub resolved: Option<ParticipantSessionTrial>,
}

impl TrialSet {
    pub fn new(table: TrialTable, data_root: impl Into<PathBuf>) -> Self {
        Self {
            table,
            data_root: data_root.into(),
            resolved: None,
        }
    }
}

/// Outcome of applying poses for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Clock position the frame was evaluated at
    pub position: f64,

    /// Trackers whose pose was applied
    pub applied: usize,

    /// Trackers left unchanged this frame (lookup or sink failure)
    pub skipped: Vec<TrackerId>,
}

/// A trial whose series are fully loaded but not yet installed.
struct PreparedTrial {
    index: usize,
    start_time: f64,
    end_time: f64,
    series: BTreeMap<TrackerId, TrackerTimeSeries>,
    without_data: BTreeSet<TrackerId>,
}

/// Drives replay of one trial set into a host.
pub struct ReplayCoordinator<H: ReplayHost> {
    host: H,
    config: ReplayConfig,
    clock: PlaybackClock,
    trial_set: Option<TrialSet>,

    /// Trackers the caller asked to drive
    active: BTreeSet<TrackerId>,

    /// Loaded series for the current trial, keyed by active tracker
    series: BTreeMap<TrackerId, TrackerTimeSeries>,

    /// Active trackers with no data in the current trial
    without_data: BTreeSet<TrackerId>,
}

impl<H: ReplayHost> ReplayCoordinator<H> {
    /// Creates a coordinator with no trial set and no active trackers.
    pub fn new(host: H, config: ReplayConfig) -> Self {
        let clock = PlaybackClock::new(config.speed_multiplier);
        Self {
            host,
            config,
            clock,
            trial_set: None,
            active: BTreeSet::new(),
            series: BTreeMap::new(),
            without_data: BTreeSet::new(),
        }
    }

    // ========== Trial set ==========

    /// Loads the trial table of a resolved triple and its first trial.
    ///
    /// Tracker paths resolve against the configured data root, or the
    /// session directory when none is configured. The previous trial set
    /// stays in place if anything fails.
    pub fn load_trial_set(&mut self, resolved: &ParticipantSessionTrial) -> Result<()> {
        let table = PathCatalog::load_table(resolved)?;
        let data_root = self
            .config
            .data_root
            .clone()
            .unwrap_or_else(|| resolved.session_dir());

        let mut set = TrialSet::new(table, data_root);
        set.resolved = Some(resolved.clone());
        self.install_trial_set(set)
    }

    /// Installs an already parsed trial set and loads its first trial.
    pub fn install_trial_set(&mut self, set: TrialSet) -> Result<()> {
        let prepared = self.prepare_trial(&set, 1, &self.active)?;
        info!(
            "Loaded trial set {} ({} trials)",
            set.table.source(),
            set.table.trial_count()
        );
        self.trial_set = Some(set);
        self.commit(prepared);
        Ok(())
    }

    // ========== Active trackers ==========

    /// Replaces the set of trackers to drive.
    ///
    /// Every requested tracker must exist in the host scene; otherwise
    /// nothing changes. With a trial set loaded, the first activation loads
    /// trial 1 and later ones reload the current trial for the new set.
    pub fn set_active_trackers<I>(&mut self, requested: I) -> Result<()>
    where
        I: IntoIterator<Item = TrackerId>,
    {
        let requested: BTreeSet<TrackerId> = requested.into_iter().collect();

        let missing: Vec<String> = requested
            .iter()
            .filter(|t| !self.host.contains_tracker(t))
            .map(|t| t.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LookupError::TrackerNotFound { missing }.into());
        }

        if let Some(set) = &self.trial_set {
            let index = match self.clock.trial_index() {
                Some(current) if !self.active.is_empty() => current,
                _ => 1,
            };
            let prepared = self.prepare_trial(set, index, &requested)?;
            self.active = requested;
            self.commit(prepared);
        } else {
            self.active = requested;
        }

        info!("Active trackers: {}", join(&self.active));
        Ok(())
    }

    // ========== Trials ==========

    /// Loads trial `index` (1-based) for every active tracker.
    ///
    /// A tracker with no column (or an empty cell) for the trial is skipped.
    /// A tracker file that cannot be loaded fails the whole call and leaves
    /// the current trial untouched.
    pub fn go_to_trial(&mut self, index: usize) -> Result<()> {
        let set = self.trial_set.as_ref().ok_or(LookupError::NoTrialSet)?;
        let prepared = self.prepare_trial(set, index, &self.active)?;
        self.commit(prepared);
        Ok(())
    }

    /// Loads the trial after the current one.
    pub fn next_trial(&mut self) -> Result<()> {
        let set = self.trial_set.as_ref().ok_or(LookupError::NoTrialSet)?;
        let current = self.clock.trial_index().unwrap_or(0);
        if current >= set.table.trial_count() {
            warn!("No more trials!");
            return Err(LookupError::NoMoreTrials.into());
        }
        self.go_to_trial(current + 1)
    }

    /// Loads the trial before the current one.
    pub fn prev_trial(&mut self) -> Result<()> {
        if self.trial_set.is_none() {
            return Err(LookupError::NoTrialSet.into());
        }
        match self.clock.trial_index() {
            Some(current) if current > 1 => self.go_to_trial(current - 1),
            _ => {
                warn!("No prior trials!");
                Err(LookupError::NoPriorTrials.into())
            }
        }
    }

    fn prepare_trial(
        &self,
        set: &TrialSet,
        index: usize,
        trackers: &BTreeSet<TrackerId>,
    ) -> Result<PreparedTrial> {
        let row = set.table.row_at(index)?;
        let (start_time, end_time) = row.bounds()?;

        let mut series = BTreeMap::new();
        let mut without_data = BTreeSet::new();

        for tracker in trackers {
            let column = match set
                .table
                .tracker_column_index(tracker.as_str(), self.config.require_unique_tracker_match)
            {
                Ok(column) => column,
                Err(LookupError::TrackerColumnNotFound(_)) => {
                    warn!("Trial {}: no column for tracker {}, skipping", index, tracker);
                    without_data.insert(tracker.clone());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let relative = row.cell(column).unwrap_or_default();
            if relative.is_empty() {
                warn!("Trial {}: no file for tracker {}, skipping", index, tracker);
                without_data.insert(tracker.clone());
                continue;
            }

            let path = resolve_data_path(&set.data_root, relative);
            let loaded = TrackerTimeSeries::load(&path)?;
            debug!("Trial {}: {} <- {} ({} samples)", index, tracker, path.display(), loaded.len());
            series.insert(tracker.clone(), loaded);
        }

        Ok(PreparedTrial {
            index,
            start_time,
            end_time,
            series,
            without_data,
        })
    }

    fn commit(&mut self, prepared: PreparedTrial) {
        self.clock
            .load_trial(prepared.index, prepared.start_time, prepared.end_time);
        self.series = prepared.series;
        self.without_data = prepared.without_data;
        info!(
            "Trial {} ready: {} trackers loaded, {} without data",
            prepared.index,
            self.series.len(),
            self.without_data.len()
        );
    }

    // ========== Playback ==========

    /// Starts or resumes playback of the current trial.
    pub fn play(&mut self) -> Result<()> {
        self.clock.play()?;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Back to the start of the trial, paused, with poses re-applied at 0.
    pub fn restart(&mut self) -> FrameReport {
        self.clock.restart();
        self.apply_at(0.0, true)
    }

    pub fn set_speed(&mut self, speed_multiplier: f64) {
        self.clock.set_speed(speed_multiplier);
    }

    /// Advances the clock by one host frame and applies the resulting poses.
    ///
    /// Returns `None` when the clock is not playing.
    pub fn tick(&mut self, dt: f64) -> Option<FrameReport> {
        if !self.clock.is_playing() {
            return None;
        }
        let position = self.clock.advance(dt);
        Some(self.apply_at(position, true))
    }

    /// Host frame entry point; ticks only in the configured phase.
    pub fn on_frame(&mut self, phase: TickPhase, dt: f64) -> Option<FrameReport> {
        if phase != self.config.tick_phase {
            return None;
        }
        self.tick(dt)
    }

    /// Jumps to a normalized position and applies poses there.
    pub fn seek_normalized(&mut self, position: f64) -> FrameReport {
        self.clock.seek(position);
        let position = self.clock.position();
        self.apply_at(position, true)
    }

    /// Optionally switches trial, then applies poses at `time`.
    ///
    /// `time` is either a normalized position or, with `normalized = false`,
    /// an exact normalized key of each tracker's series.
    pub fn set_trial_and_pose(
        &mut self,
        time: f64,
        normalized: bool,
        trial: Option<usize>,
    ) -> Result<FrameReport> {
        if let Some(index) = trial {
            self.go_to_trial(index)?;
        }
        if normalized {
            Ok(self.seek_normalized(time))
        } else {
            Ok(self.apply_at(time, false))
        }
    }

    fn apply_at(&mut self, time: f64, normalized: bool) -> FrameReport {
        let mut report = FrameReport {
            position: self.clock.position(),
            ..Default::default()
        };

        for (tracker, series) in &self.series {
            let applied = series
                .pose_at(time, normalized)
                .map_err(|e| e.to_string())
                .and_then(|pose| self.host.apply_pose(tracker, &pose).map_err(|e| e.to_string()));

            match applied {
                Ok(()) => report.applied += 1,
                Err(reason) => {
                    warn!("Tracker {} skipped this frame: {}", tracker, reason);
                    report.skipped.push(tracker.clone());
                }
            }
        }

        self.host.frame_applied(report.position);
        report
    }

    // ========== Accessors ==========

    pub fn state(&self) -> PlaybackState {
        self.clock.snapshot(self.config.tick_phase)
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn trial_set(&self) -> Option<&TrialSet> {
        self.trial_set.as_ref()
    }

    pub fn active_trackers(&self) -> &BTreeSet<TrackerId> {
        &self.active
    }

    /// Series loaded for `tracker` in the current trial.
    pub fn series(&self, tracker: &TrackerId) -> Option<&TrackerTimeSeries> {
        self.series.get(tracker)
    }

    /// Active trackers that have no data in the current trial.
    pub fn trackers_without_data(&self) -> &BTreeSet<TrackerId> {
        &self.without_data
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

/// Joins a trial-table path onto the data root, accepting either separator.
fn resolve_data_path(data_root: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .fold(data_root.to_path_buf(), |path, part| path.join(part))
}

fn join(trackers: &BTreeSet<TrackerId>) -> String {
    trackers
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PathResolutionError, ReplayError, StateError};
    use crate::playback::PlaybackStatus;
    use retrace_env::{EnvError, Pose, PoseSink, TrackerDirectory};
    use std::fs;
    use tempfile::TempDir;

    /// Scene that knows a fixed set of trackers and records applied poses.
    #[derive(Default)]
    struct TestScene {
        known: BTreeSet<TrackerId>,
        poses: BTreeMap<TrackerId, Pose>,
        reject: BTreeSet<TrackerId>,
        frames: usize,
    }

    impl TestScene {
        fn with(names: &[&str]) -> Self {
            Self {
                known: names.iter().map(|n| TrackerId::new(*n)).collect(),
                ..Default::default()
            }
        }

        fn x(&self, name: &str) -> Option<f64> {
            self.poses.get(&TrackerId::new(name)).map(|p| p.position.x)
        }
    }

    impl PoseSink for TestScene {
        fn apply_pose(
            &mut self,
            tracker: &TrackerId,
            pose: &Pose,
        ) -> std::result::Result<(), EnvError> {
            if self.reject.contains(tracker) {
                return Err(EnvError::rejected(tracker.to_string()));
            }
            self.poses.insert(tracker.clone(), *pose);
            Ok(())
        }

        fn frame_applied(&mut self, _position: f64) {
            self.frames += 1;
        }
    }

    impl TrackerDirectory for TestScene {
        fn available_trackers(&self) -> BTreeSet<TrackerId> {
            self.known.clone()
        }
    }

    /// Writes a tracker file whose pos_x equals the sample time.
    fn write_tracker(dir: &Path, name: &str, times: &[f64]) {
        let mut contents = String::from("time,pos_x,pos_y,pos_z,rot_x,rot_y,rot_z\n");
        for t in times {
            contents.push_str(&format!("{},{},0,0,0,0,0\n", t, t));
        }
        fs::write(dir.join(name), contents).unwrap();
    }

    /// root/P01/S001/trials.csv with two trials over head and hand trackers.
    fn session() -> (TempDir, ParticipantSessionTrial) {
        let root = TempDir::new().unwrap();
        let session_dir = root.path().join("P01").join("S001");
        fs::create_dir_all(session_dir.join("trackers")).unwrap();

        fs::write(
            session_dir.join("trials.csv"),
            "id,start_time,end_time,canceled_trial,tracker_head,tracker_hand\n\
             1,0,10,0,trackers/head_1.csv,trackers/hand_1.csv\n\
             2,10,30,0,trackers/head_2.csv,\n\
             3,30,40,0,trackers/head_3.csv,trackers/hand_3.csv\n",
        )
        .unwrap();

        let trackers = session_dir.join("trackers");
        write_tracker(&trackers, "head_1.csv", &[0.0, 5.0, 10.0]);
        write_tracker(&trackers, "hand_1.csv", &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        write_tracker(&trackers, "head_2.csv", &[10.0, 20.0, 30.0]);
        // trial 3 head file deliberately missing
        write_tracker(&trackers, "hand_3.csv", &[30.0, 40.0]);

        let resolved = PathCatalog::new(root.path()).resolve(None, None, None).unwrap();
        (root, resolved)
    }

    fn coordinator(scene: TestScene) -> ReplayCoordinator<TestScene> {
        ReplayCoordinator::new(scene, ReplayConfig::default())
    }

    #[test]
    fn test_nearest_sample_scenario() {
        let root = TempDir::new().unwrap();
        write_tracker(root.path(), "head.csv", &[0.0, 5.0, 10.0]);

        let table = TrialTable::parse([
            "id,start_time,end_time,canceled_trial,tracker_head",
            "1,0,10,0,head.csv",
        ])
        .unwrap();

        let mut replay = coordinator(TestScene::with(&["head"]));
        replay.install_trial_set(TrialSet::new(table, root.path())).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();

        let keys: Vec<f64> = replay.series(&TrackerId::new("head")).unwrap().keys().collect();
        assert_eq!(keys, vec![0.0, 0.5, 1.0]);

        let report = replay.seek_normalized(0.4);
        assert_eq!(report.applied, 1);
        assert_eq!(replay.host().x("head"), Some(5.0));
    }

    #[test]
    fn test_first_activation_loads_first_trial() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head", "hand"]));
        replay.load_trial_set(&resolved).unwrap();
        assert_eq!(replay.state().trial_index, Some(1));
        assert!(replay.series(&TrackerId::new("head")).is_none());

        replay
            .set_active_trackers([TrackerId::new("head"), TrackerId::new("hand")])
            .unwrap();
        assert_eq!(replay.state().trial_index, Some(1));
        assert_eq!(replay.series(&TrackerId::new("hand")).unwrap().len(), 6);
    }

    #[test]
    fn test_unknown_tracker_rejects_whole_activation() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head", "hand"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();

        let err = replay
            .set_active_trackers([TrackerId::new("hand"), TrackerId::new("foot")])
            .unwrap_err();
        match err {
            ReplayError::Lookup(LookupError::TrackerNotFound { missing }) => {
                assert_eq!(missing, vec!["foot".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let active: Vec<&str> = replay.active_trackers().iter().map(|t| t.as_str()).collect();
        assert_eq!(active, vec!["head"]);
        assert!(replay.series(&TrackerId::new("head")).is_some());
        assert!(replay.series(&TrackerId::new("hand")).is_none());
    }

    #[test]
    fn test_trial_without_tracker_data_skips_it() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head", "hand", "foot"]));
        replay.load_trial_set(&resolved).unwrap();
        replay
            .set_active_trackers([
                TrackerId::new("head"),
                TrackerId::new("hand"),
                TrackerId::new("foot"),
            ])
            .unwrap();

        // foot has no column at all
        assert!(replay.trackers_without_data().contains(&TrackerId::new("foot")));

        // trial 2 has an empty hand cell
        replay.go_to_trial(2).unwrap();
        assert!(replay.series(&TrackerId::new("hand")).is_none());
        assert!(replay.trackers_without_data().contains(&TrackerId::new("hand")));

        replay.play().unwrap();
        let report = replay.tick(10.0).unwrap();
        assert_eq!(report.applied, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(replay.host().x("head"), Some(20.0));
        assert_eq!(replay.host().x("hand"), None);
    }

    #[test]
    fn test_missing_tracker_file_leaves_trial_untouched() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head", "hand"]));
        replay.load_trial_set(&resolved).unwrap();
        replay
            .set_active_trackers([TrackerId::new("head"), TrackerId::new("hand")])
            .unwrap();
        replay.seek_normalized(0.3);

        let err = replay.go_to_trial(3).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Path(PathResolutionError::FileNotFound { .. })
        ));

        assert_eq!(replay.state().trial_index, Some(1));
        assert_eq!(replay.state().position, 0.3);
        assert_eq!(replay.series(&TrackerId::new("hand")).unwrap().len(), 6);
    }

    #[test]
    fn test_tick_advances_and_applies() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head", "hand"]));
        replay.load_trial_set(&resolved).unwrap();
        replay
            .set_active_trackers([TrackerId::new("head"), TrackerId::new("hand")])
            .unwrap();

        // Not playing: nothing happens
        assert!(replay.tick(1.0).is_none());
        assert_eq!(replay.host().frames, 0);

        replay.play().unwrap();
        let report = replay.tick(4.0).unwrap();
        assert_eq!(report.position, 0.4);
        assert_eq!(report.applied, 2);
        assert_eq!(replay.host().x("hand"), Some(4.0));
        assert_eq!(replay.host().x("head"), Some(5.0));

        let report = replay.tick(20.0).unwrap();
        assert_eq!(report.position, 1.0);
        assert_eq!(replay.state().status, PlaybackStatus::Paused);
        assert_eq!(replay.host().x("head"), Some(10.0));
        assert!(replay.tick(1.0).is_none());
    }

    #[test]
    fn test_on_frame_listens_to_configured_phase() {
        let (_root, resolved) = session();
        let config = ReplayConfig {
            tick_phase: TickPhase::PostTick,
            ..Default::default()
        };
        let mut replay = ReplayCoordinator::new(TestScene::with(&["head"]), config);
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();
        replay.play().unwrap();

        assert!(replay.on_frame(TickPhase::PreTick, 1.0).is_none());
        assert!(replay.on_frame(TickPhase::Tick, 1.0).is_none());
        assert_eq!(replay.state().position, 0.0);

        let report = replay.on_frame(TickPhase::PostTick, 1.0).unwrap();
        assert_eq!(report.position, 0.1);
    }

    #[test]
    fn test_restart_reapplies_start_pose() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();
        replay.play().unwrap();
        replay.tick(9.0);
        assert_eq!(replay.host().x("head"), Some(10.0));

        let report = replay.restart();
        assert_eq!(report.position, 0.0);
        assert_eq!(replay.host().x("head"), Some(0.0));
        assert_eq!(replay.state().status, PlaybackStatus::Paused);
    }

    #[test]
    fn test_next_and_prev_trial_bounds() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["hand"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("hand")]).unwrap();

        assert!(matches!(
            replay.prev_trial(),
            Err(ReplayError::Lookup(LookupError::NoPriorTrials))
        ));
        replay.next_trial().unwrap();
        replay.next_trial().unwrap();
        assert_eq!(replay.state().trial_index, Some(3));
        assert!(matches!(
            replay.next_trial(),
            Err(ReplayError::Lookup(LookupError::NoMoreTrials))
        ));
        replay.prev_trial().unwrap();
        assert_eq!(replay.state().trial_index, Some(2));
    }

    #[test]
    fn test_go_to_trial_resets_position_keeps_playing() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();
        replay.play().unwrap();
        replay.tick(3.0);

        replay.go_to_trial(2).unwrap();
        let state = replay.state();
        assert_eq!(state.trial_index, Some(2));
        assert_eq!(state.position, 0.0);
        assert_eq!(state.status, PlaybackStatus::Playing);
        assert!(replay.clock().is_playing());
        assert_eq!(replay.clock().duration(), 20.0);

        // Next tick continues in the new trial
        let report = replay.tick(10.0).unwrap();
        assert_eq!(report.position, 0.5);
        assert_eq!(replay.host().x("head"), Some(20.0));

        assert!(matches!(
            replay.go_to_trial(9),
            Err(ReplayError::Lookup(LookupError::InvalidRowIndex { index: 9, last: 3 }))
        ));
    }

    #[test]
    fn test_set_trial_and_pose() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();

        replay.set_trial_and_pose(1.0, true, Some(2)).unwrap();
        assert_eq!(replay.host().x("head"), Some(30.0));

        // Raw lookups need an exact key
        let report = replay.set_trial_and_pose(0.5, false, None).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(replay.host().x("head"), Some(20.0));

        let report = replay.set_trial_and_pose(0.25, false, None).unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, vec![TrackerId::new("head")]);
        assert_eq!(replay.host().x("head"), Some(20.0));
    }

    #[test]
    fn test_sink_failure_skips_only_that_tracker() {
        let (_root, resolved) = session();
        let mut scene = TestScene::with(&["head", "hand"]);
        scene.reject.insert(TrackerId::new("hand"));

        let mut replay = coordinator(scene);
        replay.load_trial_set(&resolved).unwrap();
        replay
            .set_active_trackers([TrackerId::new("head"), TrackerId::new("hand")])
            .unwrap();

        let report = replay.seek_normalized(1.0);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, vec![TrackerId::new("hand")]);
        assert_eq!(replay.host().x("head"), Some(10.0));
        assert_eq!(replay.host().frames, 1);
    }

    #[test]
    fn test_zero_length_trial_cannot_play() {
        let root = TempDir::new().unwrap();
        let table = TrialTable::parse(["start_time,end_time,canceled_trial", "5,5,0"]).unwrap();

        let mut replay = coordinator(TestScene::default());
        replay.install_trial_set(TrialSet::new(table, root.path())).unwrap();

        assert!(matches!(
            replay.play(),
            Err(ReplayError::State(StateError::DivisionByZeroDuration { .. }))
        ));
    }

    #[test]
    fn test_failed_trial_set_keeps_previous() {
        let (root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["head"]));
        replay.load_trial_set(&resolved).unwrap();
        replay.set_active_trackers([TrackerId::new("head")]).unwrap();

        let broken = TrialTable::parse([
            "start_time,end_time,canceled_trial,tracker_head",
            "0,1,0,nowhere.csv",
        ])
        .unwrap();
        assert!(replay.install_trial_set(TrialSet::new(broken, root.path())).is_err());

        assert_eq!(replay.trial_set().unwrap().table.trial_count(), 3);
        assert_eq!(replay.series(&TrackerId::new("head")).unwrap().len(), 3);
    }

    #[test]
    fn test_ambiguous_tracker_fails_trial_load() {
        let (_root, resolved) = session();
        let mut replay = coordinator(TestScene::with(&["tracker"]));
        replay.load_trial_set(&resolved).unwrap();

        assert!(matches!(
            replay.set_active_trackers([TrackerId::new("tracker")]),
            Err(ReplayError::Lookup(LookupError::AmbiguousTrackerColumn { .. }))
        ));
        assert!(replay.active_trackers().is_empty());
    }

    #[test]
    fn test_data_path_accepts_both_separators() {
        let root = Path::new("/data");
        assert_eq!(
            resolve_data_path(root, "trackers\\head.csv"),
            Path::new("/data/trackers/head.csv")
        );
        assert_eq!(
            resolve_data_path(root, "trackers/head.csv"),
            Path::new("/data/trackers/head.csv")
        );
    }
}
