//! The trial table - one row per recorded trial
//!
//! Row 0 is the header. The columns after `canceled_trial` hold, per
//! tracker, the path of that tracker's sample file for the trial. Trackers
//! are matched to columns by case-insensitive substring, so the table schema
//! is discovered from the file rather than fixed at compile time.
//!
//! Fields are split on `,` with quoting disabled; fields containing a comma
//! are not supported.

use crate::error::{LookupError, ParseError, PathResolutionError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const START_TIME_COLUMN: &str = "start_time";
pub const END_TIME_COLUMN: &str = "end_time";
pub const CANCELED_TRIAL_COLUMN: &str = "canceled_trial";

const DELIMITER: u8 = b',';

/// Header-indexed store of trial rows.
#[derive(Debug, Clone)]
pub struct TrialTable {
    /// rows[0] is the header; every row has the header's width
    rows: Vec<Vec<String>>,

    /// Header name -> column index
    columns: HashMap<String, usize>,

    /// First column holding tracker paths
    tracker_start: usize,

    /// Where the table was read from (for error context)
    source: String,
}

impl TrialTable {
    /// Reads and parses a trial file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| PathResolutionError::invalid_path(path, e))?;

        let table = Self::parse_from(&contents, path.display().to_string())?;
        debug!("Loaded {} trials from {}", table.trial_count(), path.display());
        Ok(table)
    }

    /// Parses a trial table from its lines.
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let contents = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::parse_from(&contents, "<memory>".to_string())
    }

    fn parse_from(contents: &str, source: String) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .delimiter(DELIMITER)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (record_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ParseError::MalformedRow {
                path: source.clone(),
                line: record_idx + 1,
                reason: format!("CSV error: {}", e),
            })?;
            // Blank or whitespace-only line
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(record_idx + 1);

            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if let Some(header) = rows.first() {
                if cells.len() != header.len() {
                    return Err(ParseError::ColumnCountMismatch {
                        line,
                        expected: header.len(),
                        found: cells.len(),
                    }
                    .into());
                }
            }
            rows.push(cells);
        }

        if rows.len() < 2 {
            return Err(ParseError::EmptyTrialFile { path: source }.into());
        }

        let mut columns = HashMap::new();
        for (idx, name) in rows[0].iter().enumerate() {
            if columns.insert(name.clone(), idx).is_some() {
                return Err(ParseError::DuplicateColumn(name.clone()).into());
            }
        }

        let tracker_start = columns
            .get(CANCELED_TRIAL_COLUMN)
            .map(|idx| idx + 1)
            .unwrap_or(0);

        Ok(Self {
            rows,
            columns,
            tracker_start,
            source,
        })
    }

    /// Returns the header row.
    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Total rows including the header.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of trial rows (excluding the header).
    pub fn trial_count(&self) -> usize {
        self.rows.len() - 1
    }

    /// Where the table was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Exact header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Indices of the columns that hold tracker paths.
    ///
    /// Those after `canceled_trial`; without that marker, every column
    /// other than the trial bounds.
    pub fn tracker_columns(&self) -> Vec<usize> {
        (self.tracker_start..self.header().len())
            .filter(|&idx| {
                let name = self.header()[idx].as_str();
                self.columns.contains_key(CANCELED_TRIAL_COLUMN)
                    || (name != START_TIME_COLUMN && name != END_TIME_COLUMN)
            })
            .collect()
    }

    /// Header names of the tracker columns.
    pub fn tracker_column_names(&self) -> Vec<&str> {
        self.tracker_columns()
            .into_iter()
            .map(|idx| self.header()[idx].as_str())
            .collect()
    }

    /// Finds the tracker column whose header contains `tracker`
    /// (case-insensitive).
    ///
    /// A header equal to `tracker` wins outright. Otherwise, with
    /// `require_unique`, a name contained in more than one header is an
    /// error; without it the first match wins.
    pub fn tracker_column_index(
        &self,
        tracker: &str,
        require_unique: bool,
    ) -> std::result::Result<usize, LookupError> {
        let needle = tracker.to_lowercase();
        if let Some(exact) = self
            .tracker_columns()
            .into_iter()
            .find(|&idx| self.header()[idx].to_lowercase() == needle)
        {
            return Ok(exact);
        }

        let matches: Vec<usize> = self
            .tracker_columns()
            .into_iter()
            .filter(|&idx| self.header()[idx].to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [] => Err(LookupError::TrackerColumnNotFound(tracker.to_string())),
            [only] => Ok(*only),
            [first, ..] if !require_unique => Ok(*first),
            _ => Err(LookupError::AmbiguousTrackerColumn {
                tracker: tracker.to_string(),
                candidates: matches
                    .iter()
                    .map(|&idx| self.header()[idx].clone())
                    .collect(),
            }),
        }
    }

    /// Returns the trial row at `index` (1-based; row 0 is the header).
    pub fn row_at(&self, index: usize) -> std::result::Result<TrialRow<'_>, LookupError> {
        if index < 1 || index >= self.rows.len() {
            return Err(LookupError::InvalidRowIndex {
                index,
                last: self.trial_count(),
            });
        }
        Ok(TrialRow { table: self, index })
    }
}

/// A borrowed view of one trial row.
#[derive(Debug, Clone, Copy)]
pub struct TrialRow<'a> {
    table: &'a TrialTable,
    index: usize,
}

impl<'a> TrialRow<'a> {
    /// Row index in the table (1-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// All cells of the row.
    pub fn cells(&self) -> &'a [String] {
        &self.table.rows[self.index]
    }

    /// Cell at a column index.
    pub fn cell(&self, column: usize) -> Option<&'a str> {
        self.cells().get(column).map(String::as_str)
    }

    /// Cell under a header name.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table.column_index(column).and_then(|idx| self.cell(idx))
    }

    /// Parses `(start_time, end_time)` for this trial.
    pub fn bounds(&self) -> std::result::Result<(f64, f64), ParseError> {
        Ok((
            self.parse_time(START_TIME_COLUMN)?,
            self.parse_time(END_TIME_COLUMN)?,
        ))
    }

    fn parse_time(&self, column: &str) -> std::result::Result<f64, ParseError> {
        let value = self
            .get(column)
            .ok_or_else(|| ParseError::MissingColumn(column.to_string()))?;

        value.parse::<f64>().map_err(|_| ParseError::InvalidField {
            column: column.to_string(),
            row: self.index,
            value: value.to_string(),
        })
    }
}
