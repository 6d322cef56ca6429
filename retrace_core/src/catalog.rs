//! The "CATALOG" - participant / session / trial-file resolution
//!
//! Recorded data is laid out as `root/{participant}/{session}/{trials}.csv`.
//! Resolution walks the three levels in order, each level either matching
//! the requested name exactly or falling back to the first entry found.
//! Listings are sorted so the fallback does not depend on the platform's
//! directory enumeration order.

use crate::error::{PathResolutionError, Result};
use crate::trial_table::TrialTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TRIAL_EXTENSION: &str = "csv";

/// A fully resolved participant / session / trial-file triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSessionTrial {
    /// Root data directory the triple was resolved against
    pub root: PathBuf,

    /// Participant directory name
    pub participant_id: String,

    /// Session directory name
    pub session_id: String,

    /// Trial file name, including the `.csv` suffix
    pub trial_file: String,
}

impl ParticipantSessionTrial {
    /// Returns `root/{participant}`.
    pub fn participant_dir(&self) -> PathBuf {
        self.root.join(&self.participant_id)
    }

    /// Returns `root/{participant}/{session}`.
    pub fn session_dir(&self) -> PathBuf {
        self.participant_dir().join(&self.session_id)
    }

    /// Returns the full path of the trial file.
    pub fn trial_path(&self) -> PathBuf {
        self.session_dir().join(&self.trial_file)
    }
}

/// Resolves recordings under one root data directory.
#[derive(Debug, Clone)]
pub struct PathCatalog {
    root: PathBuf,
}

impl PathCatalog {
    /// Creates a catalog over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a participant / session / trial-file triple.
    ///
    /// Any of the three may be `None` (or empty) to take the first entry
    /// available at that level. A trial name without a `.csv` suffix gets one
    /// appended before matching. Nothing is returned unless all three levels
    /// resolve.
    pub fn resolve(
        &self,
        participant_id: Option<&str>,
        session_id: Option<&str>,
        trial_file: Option<&str>,
    ) -> std::result::Result<ParticipantSessionTrial, PathResolutionError> {
        // Stage 1: participant
        let participants = list_dirs(&self.root)?;
        if participants.is_empty() {
            return Err(PathResolutionError::NoParticipants {
                root: self.root.clone(),
            });
        }
        let participant_id = match requested(participant_id) {
            None => {
                info!(
                    "No participant provided, using first available participant: {}",
                    participants[0]
                );
                participants[0].clone()
            }
            Some(target) => pick(target, &participants).ok_or_else(|| {
                PathResolutionError::ParticipantNotFound {
                    requested: target.to_string(),
                    available: participants.clone(),
                }
            })?,
        };

        // Stage 2: session
        let participant_dir = self.root.join(&participant_id);
        let sessions = list_dirs(&participant_dir)?;
        if sessions.is_empty() {
            return Err(PathResolutionError::NoSessions { participant_dir });
        }
        let session_id = match requested(session_id) {
            None => {
                info!(
                    "No session provided, using first available session: {}",
                    sessions[0]
                );
                sessions[0].clone()
            }
            Some(target) => pick(target, &sessions).ok_or_else(|| {
                PathResolutionError::SessionNotFound {
                    requested: target.to_string(),
                    available: sessions.clone(),
                }
            })?,
        };

        // Stage 3: trial file
        let session_dir = participant_dir.join(&session_id);
        let trial_files = list_trial_files(&session_dir)?;
        if trial_files.is_empty() {
            return Err(PathResolutionError::NoTrialFiles { session_dir });
        }
        let trial_file = match requested(trial_file) {
            None => {
                info!(
                    "No trials file provided, using first available trials file: {}",
                    trial_files[0]
                );
                trial_files[0].clone()
            }
            Some(target) => {
                let target = with_trial_extension(target);
                pick(&target, &trial_files).ok_or_else(|| {
                    PathResolutionError::TrialFileNotFound {
                        requested: target.clone(),
                        available: trial_files.clone(),
                    }
                })?
            }
        };

        debug!(
            "Resolved {}/{}/{} under {}",
            participant_id,
            session_id,
            trial_file,
            self.root.display()
        );

        Ok(ParticipantSessionTrial {
            root: self.root.clone(),
            participant_id,
            session_id,
            trial_file,
        })
    }

    /// Reads and parses the trial table of a resolved triple.
    pub fn load_table(resolved: &ParticipantSessionTrial) -> Result<TrialTable> {
        TrialTable::load(resolved.trial_path())
    }

    /// Lists participant directories, sorted.
    pub fn participants(&self) -> std::result::Result<Vec<String>, PathResolutionError> {
        list_dirs(&self.root)
    }

    /// Lists the session directories of a participant, sorted.
    pub fn sessions(
        &self,
        participant_id: &str,
    ) -> std::result::Result<Vec<String>, PathResolutionError> {
        list_dirs(&self.root.join(participant_id))
    }

    /// Lists the trial files of a session, sorted.
    pub fn trial_files(
        &self,
        participant_id: &str,
        session_id: &str,
    ) -> std::result::Result<Vec<String>, PathResolutionError> {
        list_trial_files(&self.root.join(participant_id).join(session_id))
    }
}

fn requested(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn pick(target: &str, candidates: &[String]) -> Option<String> {
    candidates.iter().find(|c| c.as_str() == target).cloned()
}

fn with_trial_extension(name: &str) -> String {
    let extension = Path::new(name).extension().and_then(|e| e.to_str());
    if extension == Some(TRIAL_EXTENSION) {
        name.to_string()
    } else {
        format!("{}.{}", name, TRIAL_EXTENSION)
    }
}

fn list_dirs(path: &Path) -> std::result::Result<Vec<String>, PathResolutionError> {
    list_entries(path, |entry_path| entry_path.is_dir())
}

fn list_trial_files(path: &Path) -> std::result::Result<Vec<String>, PathResolutionError> {
    list_entries(path, |entry_path| {
        entry_path.is_file()
            && entry_path.extension().and_then(|e| e.to_str()) == Some(TRIAL_EXTENSION)
    })
}

fn list_entries(
    path: &Path,
    keep: impl Fn(&Path) -> bool,
) -> std::result::Result<Vec<String>, PathResolutionError> {
    let entries = fs::read_dir(path).map_err(|e| PathResolutionError::invalid_path(path, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PathResolutionError::invalid_path(path, e))?;
        let entry_path = entry.path();
        if keep(&entry_path) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    Ok(names)
}
