//! Retrace headless replay harness
//!
//! This crate plays recorded sessions without an engine attached, the same
//! way an engine host would drive them:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      ReplayRunner                         │
//! │  ┌──────────────┐  on_frame(phase, dt)  ┌───────────────┐ │
//! │  │  FrameClock  │──────────────────────►│  Coordinator  │ │
//! │  │ (virtual dt) │                       │ (retrace_core)│ │
//! │  └──────────────┘                       └───────┬───────┘ │
//! │                                   apply_pose    │         │
//! │  ┌──────────────┐                       ┌───────▼───────┐ │
//! │  │ ReplayExport │◄──── poses per frame ─│ RecordingScene│ │
//! │  └──────────────┘                       └───────────────┘ │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use retrace_sim::{ReplayRunner, SimConfig};
//!
//! let config = SimConfig {
//!     root: "/data/mocap".into(),
//!     all_trials: true,
//!     ..Default::default()
//! };
//!
//! let result = ReplayRunner::new(config).run()?;
//! assert!(result.passed());
//! ```

mod config;
mod context;
mod exporter;
mod runner;
mod scene;

pub use config::{ConfigError, SimConfig};
pub use context::FrameClock;
pub use exporter::{ReplayExport, ReplayFrame, TrackerPose, TrialExport};
pub use runner::{ReplayRunner, RunResult, TrialResult};
pub use scene::RecordingScene;
