//! Retrace Host Abstraction Layer
//!
//! This crate describes what the replay core needs from the application
//! that embeds it, without depending on any particular engine or scene graph.
//!
//! # Core Concept: The Pose Sink
//!
//! The core never touches entities directly. The host provides:
//! - **Scene lookup**: which trackers exist (`TrackerDirectory`)
//! - **Pose output**: where resolved poses go (`PoseSink`)
//! - **Frame delivery**: which phase the coordinator listens to (`TickPhase`)
//!
//! # Example
//!
//! ```ignore
//! use retrace_core::ReplayCoordinator;
//! use retrace_env::{ReplayHost, TickPhase};
//!
//! fn on_frame<H: ReplayHost>(coordinator: &mut ReplayCoordinator<H>, dt: f64) {
//!     for phase in TickPhase::all() {
//!         coordinator.on_frame(phase, dt);
//!     }
//! }
//! ```

mod error;
mod phase;
mod scene;
mod types;

pub use error::EnvError;
pub use phase::TickPhase;
pub use scene::{PoseSink, ReplayHost, TrackerDirectory};
pub use types::{Pose, TrackerId};
