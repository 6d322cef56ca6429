//! Error types for the Retrace host abstraction.

use thiserror::Error;

/// Errors raised by the host while applying replay output.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The sink refused the pose (entity destroyed, locked, etc.)
    #[error("Pose rejected: {0}")]
    SinkRejected(String),

    /// The tracker is no longer present in the scene
    #[error("Tracker unavailable: {0}")]
    TrackerUnavailable(String),
}

impl EnvError {
    /// Creates a sink rejection error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::SinkRejected(msg.into())
    }

    /// Creates an unavailable-tracker error.
    pub fn unavailable(tracker: impl std::fmt::Display) -> Self {
        Self::TrackerUnavailable(tracker.to_string())
    }
}
