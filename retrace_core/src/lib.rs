//! Retrace Core - Motion-Capture Session Replay
//!
//! This library replays recorded multi-tracker sessions into a host scene:
//! 1. **Catalog**: resolves `root/{participant}/{session}/{trials}.csv`
//! 2. **Trial table**: header-indexed trial rows, trackers matched by substring
//! 3. **Tracker series**: per-tracker samples keyed by normalized time, nearest-sample lookup
//! 4. **Playback clock**: speed-scaled normalized position with play / pause / restart / seek
//! 5. **Coordinator**: ties the above to a host's pose sink, one frame at a time

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod playback;
pub mod tracker_series;
pub mod trial_table;

// Re-export key types for convenience
pub use catalog::{ParticipantSessionTrial, PathCatalog};
pub use config::ReplayConfig;
pub use coordinator::{FrameReport, ReplayCoordinator, TrialSet};
pub use error::{LookupError, ParseError, PathResolutionError, ReplayError, Result, StateError};
pub use playback::{PlaybackClock, PlaybackState, PlaybackStatus};
pub use tracker_series::{Sample, TrackerTimeSeries};
pub use trial_table::{TrialRow, TrialTable};
