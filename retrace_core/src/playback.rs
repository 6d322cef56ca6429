//! Playback clock - normalized position over the current trial
//!
//! The clock runs in normalized time: 0 is the trial's `start_time`, 1 its
//! `end_time`. Advancing by a frame's elapsed time moves the position by
//! `speed * dt / (end - start)`. Reaching 1 pauses playback; calling
//! `play()` from there starts the trial over.

use crate::config::{MAX_SPEED, MIN_SPEED};
use crate::error::StateError;
use retrace_env::TickPhase;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Running state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// No playback since the trial was loaded
    #[default]
    Stopped,

    /// Advancing on every tick
    Playing,

    /// Holding position (explicit pause, restart, or end of trial)
    Paused,
}

/// Snapshot of everything that defines the current playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Trial row currently loaded (1-based), if any
    pub trial_index: Option<usize>,

    /// Normalized position in [0, 1]
    pub position: f64,

    /// Speed multiplier in [1, 2]
    pub speed_multiplier: f64,

    /// Running state
    pub status: PlaybackStatus,

    /// Host phase playback advances in
    pub tick_phase: TickPhase,
}

/// Frame-driven clock over one trial.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    trial_index: Option<usize>,
    start_time: f64,
    end_time: f64,
    position: f64,
    speed: f64,
    status: PlaybackStatus,
}

impl PlaybackClock {
    /// Creates a stopped clock with no trial.
    pub fn new(speed_multiplier: f64) -> Self {
        Self {
            trial_index: None,
            start_time: 0.0,
            end_time: 0.0,
            position: 0.0,
            speed: clamp_speed(speed_multiplier),
            status: PlaybackStatus::Stopped,
        }
    }

    /// Switches to a trial: new bounds, position 0.
    ///
    /// The running state carries over, except that a running clock stops
    /// when the new trial has no playable duration.
    pub fn load_trial(&mut self, trial_index: usize, start_time: f64, end_time: f64) {
        self.trial_index = Some(trial_index);
        self.start_time = start_time;
        self.end_time = end_time;
        self.position = 0.0;
        if self.status == PlaybackStatus::Playing && !self.has_playable_duration() {
            warn!("Trial {} has no playable duration, stopping", trial_index);
            self.status = PlaybackStatus::Stopped;
        }
        debug!(
            "Clock on trial {} ({} -> {}, {}s, {:?})",
            trial_index,
            start_time,
            end_time,
            self.duration(),
            self.status
        );
    }

    /// Starts or resumes playback.
    ///
    /// From the end of the trial, playback restarts at 0. A trial whose
    /// duration is not positive cannot be played.
    pub fn play(&mut self) -> Result<(), StateError> {
        if self.trial_index.is_none() {
            return Err(StateError::NoTrialLoaded);
        }
        if !self.has_playable_duration() {
            return Err(StateError::DivisionByZeroDuration {
                start: self.start_time,
                end: self.end_time,
            });
        }

        if self.position == 1.0 {
            self.position = 0.0;
        }
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    /// Pauses a running clock; no-op otherwise.
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    /// Back to position 0, paused.
    pub fn restart(&mut self) {
        self.position = 0.0;
        self.status = PlaybackStatus::Paused;
    }

    /// Advances by `dt` seconds of host time and returns the new position.
    ///
    /// Only moves while playing. Reaching the end clamps to 1 and pauses.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.status != PlaybackStatus::Playing || !(dt > 0.0) {
            return self.position;
        }

        self.position += self.speed * dt / self.duration();
        if self.position >= 1.0 {
            self.position = 1.0;
            self.status = PlaybackStatus::Paused;
            info!("Trial {:?} reached the end of playback", self.trial_index);
        }
        self.position
    }

    /// Jumps to a normalized position without changing the running state.
    ///
    /// Out-of-range targets are clamped to [0, 1].
    pub fn seek(&mut self, position: f64) {
        self.position = if (0.0..=1.0).contains(&position) {
            position
        } else {
            warn!("Seek target {} outside [0, 1], clamping", position);
            if position.is_nan() {
                0.0
            } else {
                position.clamp(0.0, 1.0)
            }
        };
    }

    /// Sets the speed multiplier, clamped to [1, 2].
    pub fn set_speed(&mut self, speed_multiplier: f64) {
        self.speed = clamp_speed(speed_multiplier);
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn trial_index(&self) -> Option<usize> {
        self.trial_index
    }

    /// Trial `end_time - start_time`.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    fn has_playable_duration(&self) -> bool {
        let duration = self.duration();
        duration > 0.0 && duration.is_finite()
    }

    /// Snapshot of the clock, tagged with the host phase it runs in.
    pub fn snapshot(&self, tick_phase: TickPhase) -> PlaybackState {
        PlaybackState {
            trial_index: self.trial_index,
            position: self.position,
            speed_multiplier: self.speed,
            status: self.status,
            tick_phase,
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(MIN_SPEED)
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if (MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return speed;
    }
    warn!("Speed multiplier {} outside [{}, {}], clamping", speed, MIN_SPEED, MAX_SPEED);
    if speed.is_nan() {
        MIN_SPEED
    } else {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn clock(start: f64, end: f64) -> PlaybackClock {
        let mut clock = PlaybackClock::new(1.0);
        clock.load_trial(1, start, end);
        clock
    }

    #[test]
    fn test_initial_state() {
        let clock = PlaybackClock::default();
        assert_eq!(clock.status(), PlaybackStatus::Stopped);
        assert_eq!(clock.position(), 0.0);
        assert_eq!(clock.trial_index(), None);
    }

    #[test]
    fn test_play_requires_trial() {
        let mut clock = PlaybackClock::default();
        assert!(matches!(clock.play(), Err(StateError::NoTrialLoaded)));
    }

    #[test]
    fn test_zero_duration_rejected_before_playing() {
        let mut clock = clock(5.0, 5.0);
        assert!(matches!(
            clock.play(),
            Err(StateError::DivisionByZeroDuration { .. })
        ));
        assert_eq!(clock.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_advance_scales_with_speed_and_duration() {
        let mut clock = clock(10.0, 20.0);
        clock.set_speed(2.0);
        clock.play().unwrap();

        assert_relative_eq!(clock.advance(1.0), 0.2, epsilon = 1e-12);
        assert_relative_eq!(clock.advance(0.5), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_advance_clamps_and_pauses_at_end() {
        let mut clock = clock(0.0, 1.0);
        clock.play().unwrap();

        assert_eq!(clock.advance(5.0), 1.0);
        assert_eq!(clock.status(), PlaybackStatus::Paused);

        // Paused: further advances do nothing
        assert_eq!(clock.advance(0.1), 1.0);
    }

    #[test]
    fn test_play_at_end_restarts_from_zero() {
        let mut clock = clock(0.0, 1.0);
        clock.play().unwrap();
        clock.advance(2.0);

        clock.play().unwrap();
        assert_eq!(clock.position(), 0.0);
        assert!(clock.is_playing());
    }

    #[test]
    fn test_pause_only_from_playing() {
        let mut clock = clock(0.0, 1.0);
        clock.pause();
        assert_eq!(clock.status(), PlaybackStatus::Stopped);

        clock.play().unwrap();
        clock.pause();
        assert_eq!(clock.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_restart_from_any_state() {
        let mut clock = clock(0.0, 4.0);
        clock.play().unwrap();
        clock.advance(1.0);

        clock.restart();
        assert_eq!(clock.position(), 0.0);
        assert_eq!(clock.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_seek_keeps_running_state() {
        let mut clock = clock(0.0, 4.0);
        clock.play().unwrap();

        clock.seek(0.75);
        assert_eq!(clock.position(), 0.75);
        assert!(clock.is_playing());

        clock.seek(3.0);
        assert_eq!(clock.position(), 1.0);
        clock.seek(-1.0);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut clock = PlaybackClock::new(5.0);
        assert_eq!(clock.speed(), 2.0);
        clock.set_speed(0.1);
        assert_eq!(clock.speed(), 1.0);
    }

    #[test]
    fn test_load_trial_keeps_running_state() {
        let mut clock = clock(0.0, 4.0);
        clock.play().unwrap();
        clock.advance(1.0);

        clock.load_trial(2, 4.0, 8.0);
        assert_eq!(clock.position(), 0.0);
        assert!(clock.is_playing());
        assert_eq!(clock.snapshot(TickPhase::Tick).trial_index, Some(2));

        clock.pause();
        clock.load_trial(3, 8.0, 12.0);
        assert_eq!(clock.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_load_zero_length_trial_stops_running_clock() {
        let mut clock = clock(0.0, 4.0);
        clock.play().unwrap();

        clock.load_trial(2, 4.0, 4.0);
        assert_eq!(clock.status(), PlaybackStatus::Stopped);
        assert_eq!(clock.advance(1.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_advance_is_monotonic(
            duration in 0.01f64..1000.0,
            speed in 1.0f64..=2.0,
            steps in prop::collection::vec(0.0f64..5.0, 1..50),
        ) {
            let mut clock = PlaybackClock::new(speed);
            clock.load_trial(1, 0.0, duration);
            clock.play().unwrap();

            let mut last = clock.position();
            for dt in steps {
                let now = clock.advance(dt);
                prop_assert!(now >= last);
                prop_assert!(now <= 1.0);
                last = now;
            }
        }

        #[test]
        fn prop_zero_advance_is_noop(position in 0.0f64..1.0, repeats in 1usize..20) {
            let mut clock = PlaybackClock::new(1.0);
            clock.load_trial(1, 0.0, 10.0);
            clock.play().unwrap();
            clock.seek(position);

            for _ in 0..repeats {
                prop_assert_eq!(clock.advance(0.0), position);
            }
            prop_assert!(clock.is_playing());
        }
    }
}
