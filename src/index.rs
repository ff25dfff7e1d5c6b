//! Per-case `index.json` summary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::{read_json, write_json};
use crate::error::ConvertError;
use crate::record::{Record, Season};

/// File name of the per-case summary.
pub const INDEX_FILE: &str = "index.json";

/// Path of `index.json` inside a case folder.
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// Access to the fields the index summarizes.
///
/// Implemented by every row type that can be written to chunk files, so one
/// index builder serves both the text and the spreadsheet path.
pub trait FrameRow {
    /// Formatted `time` value, if the row carries one.
    fn time(&self) -> Option<&str>;
    /// Test-cell sensible heat, if the row carries one.
    fn qsens_test(&self) -> Option<f64>;
    /// Reference-cell sensible heat, if the row carries one.
    fn qsens_ref(&self) -> Option<f64>;
}

impl FrameRow for Record {
    fn time(&self) -> Option<&str> {
        Some(&self.time)
    }

    fn qsens_test(&self) -> Option<f64> {
        Some(self.qsens_test)
    }

    fn qsens_ref(&self) -> Option<f64> {
        Some(self.qsens_ref)
    }
}

/// Minimum, maximum and mean of a series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl EnergyStats {
    /// Computes the statistics; an empty series yields all zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use simdata::index::EnergyStats;
    ///
    /// let s = EnergyStats::from_values([1.0, -2.0, 4.0]);
    /// assert_eq!((s.min, s.max, s.avg), (-2.0, 4.0, 1.0));
    /// assert_eq!(EnergyStats::from_values([]), EnergyStats::default());
    /// ```
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0_f64;
        let mut n = 0_usize;
        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            avg: sum / n as f64,
        }
    }
}

/// Contents of `index.json`.
///
/// Energy statistics are `None` only when the source has no such column at
/// all; they are then left out of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseIndex {
    pub sheet_name: String,
    pub total_frames: usize,
    pub num_chunks: usize,
    pub chunk_size: usize,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_energy_test: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy_test: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_energy_test: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_energy_ref: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy_ref: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_energy_ref: Option<f64>,
    pub season: Season,
    pub start_date: String,
}

/// Inputs to [`CaseIndex::build`] that do not come from the rows.
#[derive(Debug, Clone)]
pub struct IndexMeta<'a> {
    pub name: &'a str,
    pub season: Season,
    pub chunk_size: usize,
    /// `startDate` value; when `None` the date part of the first row's time.
    pub start_date: Option<String>,
    /// Whether the rows carry a time column at all.
    pub has_time: bool,
    /// Whether the rows carry `Qsens_test` / `Qsens_ref` columns at all.
    pub has_energy: (bool, bool),
}

impl<'a> IndexMeta<'a> {
    /// Metadata for rows of the fixed [`Record`] shape.
    pub fn for_records(name: &'a str, season: Season, chunk_size: usize) -> Self {
        Self {
            name,
            season,
            chunk_size,
            start_date: None,
            has_time: true,
            has_energy: (true, true),
        }
    }
}

impl CaseIndex {
    /// Summarizes `rows` as they are partitioned into chunks.
    pub fn build<R: FrameRow>(rows: &[R], meta: &IndexMeta<'_>) -> Self {
        let first_time = rows.first().and_then(FrameRow::time).map(str::to_string);
        let last_time = rows.last().and_then(FrameRow::time).map(str::to_string);

        let (start_time, end_time) = if meta.has_time {
            (
                Some(first_time.clone().unwrap_or_default()),
                Some(last_time.unwrap_or_default()),
            )
        } else {
            (None, None)
        };

        let start_date = meta.start_date.clone().unwrap_or_else(|| {
            first_time
                .as_deref()
                .and_then(|t| t.split_whitespace().next())
                .unwrap_or_default()
                .to_string()
        });

        let test = meta
            .has_energy
            .0
            .then(|| EnergyStats::from_values(rows.iter().filter_map(FrameRow::qsens_test)));
        let reference = meta
            .has_energy
            .1
            .then(|| EnergyStats::from_values(rows.iter().filter_map(FrameRow::qsens_ref)));

        Self {
            sheet_name: meta.name.to_string(),
            total_frames: rows.len(),
            num_chunks: crate::chunk::chunk_count(rows.len(), meta.chunk_size),
            chunk_size: meta.chunk_size,
            start_time,
            end_time,
            min_energy_test: test.map(|s| s.min),
            max_energy_test: test.map(|s| s.max),
            avg_energy_test: test.map(|s| s.avg),
            min_energy_ref: reference.map(|s| s.min),
            max_energy_ref: reference.map(|s| s.max),
            avg_energy_ref: reference.map(|s| s.avg),
            season: meta.season,
            start_date,
        }
    }

    /// Writes this index to `dir/index.json`.
    ///
    /// # Errors
    ///
    /// Returns a `ConvertError` if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<(), ConvertError> {
        write_json(&index_path(dir), self)
    }

    /// Reads `dir/index.json`.
    ///
    /// # Errors
    ///
    /// Returns a `ConvertError` if the file is missing or malformed.
    pub fn read(dir: &Path) -> Result<Self, ConvertError> {
        read_json(&index_path(dir))
    }
}
