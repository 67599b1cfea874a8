//! Per-day request counter for rate-limited providers.
//!
//! The counter persists `{"date": "YYYY-MM-DD", "count": N}` and resets when
//! the local calendar date changes. A missing or unreadable record counts as
//! zero so a corrupt file never blocks routing.

use std::io;
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::{create_dir_all, open_dir_and_file};

/// Default location of the GraphHopper usage record.
pub const DEFAULT_USAGE_FILE: &str = "data/graphhopper_usage.json";

/// Errors raised while persisting the usage record.
#[derive(Debug, Error)]
pub enum UsageCounterError {
    /// Reading the record failed for a reason other than absence.
    #[error("failed to read usage record {path}")]
    Read {
        /// Record path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing the record failed.
    #[error("failed to write usage record {path}")]
    Write {
        /// Record path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Encoding the record failed.
    #[error("failed to encode usage record")]
    Encode {
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The record path has no file name.
    #[error("usage record path {path} has no file name")]
    InvalidPath {
        /// Offending path.
        path: Utf8PathBuf,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct UsageRecord {
    date: NaiveDate,
    count: u64,
}

/// Counts requests per local calendar day in a JSON file.
///
/// Read-increment-write runs under one mutex, so concurrent increments on
/// the same counter are never lost.
///
/// # Examples
/// ```no_run
/// use routecompare_data::DailyUsageCounter;
///
/// let counter = DailyUsageCounter::new("data/graphhopper_usage.json");
/// let today = counter.increment()?;
/// assert_eq!(counter.count_today()?, today);
/// # Ok::<(), routecompare_data::UsageCounterError>(())
/// ```
#[derive(Debug)]
pub struct DailyUsageCounter {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl DailyUsageCounter {
    /// Create a counter backed by the file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Requests counted so far today.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read.
    pub fn count_today(&self) -> Result<u64, UsageCounterError> {
        self.count_on(today())
    }

    /// Record one request today and return the new count.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be read or written.
    pub fn increment(&self) -> Result<u64, UsageCounterError> {
        self.increment_on(today())
    }

    /// Requests counted on `date`; any other stored date counts as zero.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read.
    pub fn count_on(&self, date: NaiveDate) -> Result<u64, UsageCounterError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_count(date)
    }

    /// Record one request on `date` and return the new count.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be read or written.
    pub fn increment_on(&self, date: NaiveDate) -> Result<u64, UsageCounterError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let count = self.read_count(date)?.saturating_add(1);
        self.write(&UsageRecord { date, count })?;
        Ok(count)
    }

    fn read_count(&self, date: NaiveDate) -> Result<u64, UsageCounterError> {
        let read_error = |source| UsageCounterError::Read {
            path: self.path.clone(),
            source,
        };
        let contents = match open_dir_and_file(&self.path)
            .and_then(|(dir, name)| dir.read_to_string(name))
        {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(read_error(err)),
        };
        match serde_json::from_str::<UsageRecord>(&contents) {
            Ok(record) if record.date == date => Ok(record.count),
            Ok(_) => Ok(0),
            Err(err) => {
                warn!("ignoring unreadable usage record {}: {err}", self.path);
                Ok(0)
            }
        }
    }

    fn write(&self, record: &UsageRecord) -> Result<(), UsageCounterError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| UsageCounterError::InvalidPath {
                path: self.path.clone(),
            })?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let encoded =
            serde_json::to_string(record).map_err(|source| UsageCounterError::Encode { source })?;
        create_dir_all(parent)
            .and_then(|dir| dir.write(file_name, encoded))
            .map_err(|source| UsageCounterError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
