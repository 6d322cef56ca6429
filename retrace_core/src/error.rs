//! Error taxonomy for the replay core.
//!
//! Four families, one per concern: resolving files on disk, parsing them,
//! looking things up in what was parsed, and driving the playback clock.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while resolving participant / session / trial files on disk.
#[derive(Debug, Error)]
pub enum PathResolutionError {
    #[error("No participant directories found under {root}")]
    NoParticipants { root: PathBuf },

    #[error("Participant not found: target {requested}; available: {}", .available.join(", "))]
    ParticipantNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("No session directories found under {participant_dir}")]
    NoSessions { participant_dir: PathBuf },

    #[error("Session not found: target {requested}; available: {}", .available.join(", "))]
    SessionNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("No trial files (*.csv) found under {session_dir}")]
    NoTrialFiles { session_dir: PathBuf },

    #[error("Trial file not found: target {requested}; available: {}", .available.join(", "))]
    TrialFileNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("Invalid path {path}: {source}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },
}

impl PathResolutionError {
    /// Wraps an I/O failure on `path`.
    pub fn invalid_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InvalidPath {
            path: path.into(),
            source,
        }
    }
}

/// Failures while parsing trial tables and tracker sample files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Trial file {path} needs a header and at least one trial row")]
    EmptyTrialFile { path: String },

    #[error("Malformed sample in {path} at line {line}: {reason}")]
    MalformedSample {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Malformed row in {path} at line {line}: {reason}")]
    MalformedRow {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Line {line} has {found} columns, header has {expected}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column in trial header: {0}")]
    DuplicateColumn(String),

    #[error("Trial table has no '{0}' column")]
    MissingColumn(String),

    #[error("Invalid value '{value}' in column '{column}' of row {row}")]
    InvalidField {
        column: String,
        row: usize,
        value: String,
    },
}

/// Failures while looking up rows, columns, samples and trackers.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid row index {index}: valid trial rows are 1..={last}")]
    InvalidRowIndex { index: usize, last: usize },

    #[error("No samples loaded for {0}")]
    EmptySeries(String),

    #[error("No sample with key {key} in {series}")]
    SampleNotFound { series: String, key: f64 },

    #[error("Trackers not found in scene: {}", .missing.join(", "))]
    TrackerNotFound { missing: Vec<String> },

    #[error("No tracker column matches '{0}'")]
    TrackerColumnNotFound(String),

    #[error("Tracker '{tracker}' matches several columns: {}", .candidates.join(", "))]
    AmbiguousTrackerColumn {
        tracker: String,
        candidates: Vec<String>,
    },

    #[error("No trial set loaded")]
    NoTrialSet,

    #[error("No more trials")]
    NoMoreTrials,

    #[error("No prior trials")]
    NoPriorTrials,
}

/// Failures driving the playback clock.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Trial duration is not positive (start {start}, end {end}); cannot advance playback")]
    DivisionByZeroDuration { start: f64, end: f64 },

    #[error("No trial loaded")]
    NoTrialLoaded,
}

/// Any error surfaced by the replay core.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Path(#[from] PathResolutionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    State(#[from] StateError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
