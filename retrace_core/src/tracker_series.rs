//! The "TIME" Series - per-tracker samples keyed by normalized time
//!
//! Each tracker file is a recording of `time,posX,posY,posZ,rotX,rotY,rotZ`
//! rows. After loading, raw times are rescaled to [0, 1] over the file's
//! first and last timestamps, so every tracker can be scrubbed with the same
//! playback position regardless of its own sampling rate.
//!
//! Lookups are nearest-neighbor only; no interpolation between samples.

use crate::error::{LookupError, ParseError, PathResolutionError, Result};
use nalgebra::Vector3;
use retrace_env::Pose;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Number of fields in a tracker sample row.
pub const SAMPLE_FIELDS: usize = 7;

/// One recorded tracker sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Raw timestamp, same unit as the trial table's start/end times
    pub time: f64,

    /// Recorded pose
    pub pose: Pose,
}

impl Sample {
    pub fn new(time: f64, pose: Pose) -> Self {
        Self { time, pose }
    }
}

/// A tracker's samples plus the normalized-time index built over them.
#[derive(Debug, Clone)]
pub struct TrackerTimeSeries {
    /// Where the samples came from (for diagnostics)
    source: String,

    /// Samples in file order (assumed ascending in time, not re-sorted)
    samples: Vec<Sample>,

    /// (normalized key, pose), sorted by key, one entry per distinct key
    index: Vec<(f64, Pose)>,

    /// First sample time
    t_min: f64,

    /// Last sample time
    t_max: f64,
}

impl TrackerTimeSeries {
    /// Loads a tracker sample file.
    ///
    /// The first line is a header and is discarded. Every other line must
    /// hold exactly seven numeric fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();

        if !path.is_file() {
            return Err(PathResolutionError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let file = File::open(path).map_err(|e| PathResolutionError::invalid_path(path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut samples = Vec::new();
        for (record_idx, result) in reader.records().enumerate() {
            // +1 for the header, +1 for 1-based lines
            let fallback_line = record_idx + 2;

            let record = result.map_err(|e| ParseError::MalformedSample {
                path: source.clone(),
                line: fallback_line,
                reason: format!("CSV error: {}", e),
            })?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line);

            samples.push(parse_sample(&record, &source, line)?);
        }

        debug!("Loaded {} samples from {}", samples.len(), source);
        Ok(Self::from_samples(source, samples))
    }

    /// Builds a series from in-memory samples and normalizes it.
    pub fn from_samples(source: impl Into<String>, samples: Vec<Sample>) -> Self {
        let source = source.into();
        let (t_min, t_max) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => (0.0, 0.0),
        };

        let mut series = Self {
            source,
            samples,
            index: Vec::new(),
            t_min,
            t_max,
        };
        series.normalize();
        series
    }

    /// Rebuilds the normalized-time index.
    ///
    /// Samples whose keys collide keep only the later sample. A zero
    /// duration maps every sample to key 0.
    fn normalize(&mut self) {
        let duration = self.duration();
        if !self.samples.is_empty() && duration == 0.0 {
            warn!(
                "{}: all {} samples share one timestamp; every sample maps to t=0",
                self.source,
                self.samples.len()
            );
        }

        let mut keyed: Vec<(f64, Pose)> = self
            .samples
            .iter()
            .map(|s| {
                let key = if duration == 0.0 {
                    0.0
                } else {
                    (s.time - self.t_min) / duration
                };
                (key, s.pose)
            })
            .collect();

        // Stable, so equal keys stay in file order and the later one is kept.
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut index: Vec<(f64, Pose)> = Vec::with_capacity(keyed.len());
        for (key, pose) in keyed {
            match index.last_mut() {
                Some(last) if last.0 == key => last.1 = pose,
                _ => index.push((key, pose)),
            }
        }

        if index.len() < self.samples.len() {
            debug!(
                "{}: {} samples collapsed onto existing keys",
                self.source,
                self.samples.len() - index.len()
            );
        }
        self.index = index;
    }

    /// Resolves the pose at `time`.
    ///
    /// With `normalized`, `time` is a position in [0, 1] (out-of-range values
    /// are clamped with a warning) and the nearest key wins; on a tie the
    /// earlier key wins. Without it, `time` must equal a stored normalized key.
    pub fn pose_at(&self, time: f64, normalized: bool) -> std::result::Result<Pose, LookupError> {
        if self.index.is_empty() {
            return Err(LookupError::EmptySeries(self.source.clone()));
        }

        if !normalized {
            return self
                .index
                .binary_search_by(|(key, _)| key.total_cmp(&time))
                .map(|idx| self.index[idx].1)
                .map_err(|_| LookupError::SampleNotFound {
                    series: self.source.clone(),
                    key: time,
                });
        }

        let idx = self.nearest_index(clamp_normalized(time, &self.source));
        Ok(self.index[idx].1)
    }

    /// Returns the normalized key `pose_at(time, true)` would resolve to.
    pub fn nearest_key(&self, time: f64) -> Option<f64> {
        if self.index.is_empty() {
            return None;
        }
        let idx = self.nearest_index(clamp_normalized(time, &self.source));
        Some(self.index[idx].0)
    }

    fn nearest_index(&self, t: f64) -> usize {
        let upper = self.index.partition_point(|(key, _)| *key < t);
        if upper == 0 {
            return 0;
        }
        if upper == self.index.len() {
            return upper - 1;
        }

        let below = t - self.index[upper - 1].0;
        let above = self.index[upper].0 - t;
        if above < below {
            upper
        } else {
            upper - 1
        }
    }

    /// Where the series was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Samples in file order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Distinct normalized keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.index.iter().map(|(key, _)| *key)
    }

    /// Number of loaded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Last minus first sample time.
    pub fn duration(&self) -> f64 {
        self.t_max - self.t_min
    }
}

fn clamp_normalized(time: f64, source: &str) -> f64 {
    if (0.0..=1.0).contains(&time) {
        return time;
    }
    warn!("{}: time {} not normalized, clamping to [0, 1]", source, time);
    if time.is_nan() {
        0.0
    } else {
        time.clamp(0.0, 1.0)
    }
}

fn parse_sample(record: &csv::StringRecord, source: &str, line: usize) -> Result<Sample> {
    if record.len() != SAMPLE_FIELDS {
        return Err(ParseError::MalformedSample {
            path: source.to_string(),
            line,
            reason: format!("expected {} fields, found {}", SAMPLE_FIELDS, record.len()),
        }
        .into());
    }

    const NAMES: [&str; SAMPLE_FIELDS] =
        ["time", "pos_x", "pos_y", "pos_z", "rot_x", "rot_y", "rot_z"];
    let mut values = [0.0f64; SAMPLE_FIELDS];
    for (i, field) in record.iter().enumerate() {
        values[i] = field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::MalformedSample {
                path: source.to_string(),
                line,
                reason: format!("invalid {}: '{}'", NAMES[i], field),
            })?;
    }

    let [time, x, y, z, rot_x, rot_y, rot_z] = values;
    Ok(Sample::new(
        time,
        Pose::from_euler_degrees(Vector3::new(x, y, z), rot_x, rot_y, rot_z),
    ))
}
