//! In-place rewrite of chunk timestamps against a corrected start date.
//!
//! Chunk files are assumed dense, contiguous and in original record order;
//! that is not verified. Only `time` fields and the `startTime`, `endTime`,
//! `season` and `startDate` index fields change. Statistics, totals and any
//! other keys of chunk and index objects are left as they are.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::chunk::{chunk_path, read_json, write_json};
use crate::config::{DEFAULT_CHUNK_SIZE, RewriteConfig};
use crate::error::ConvertError;
use crate::index::index_path;
use crate::record::{DATE_FORMAT, Season, minute_offset_time};

/// What a folder rewrite touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Chunk files listed by the index.
    pub chunks_expected: usize,
    /// Chunk files actually rewritten.
    pub chunks_rewritten: usize,
    /// Records whose `time` was reassigned.
    pub records: usize,
}

/// Totals over a batch of folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub folders_rewritten: usize,
    pub folders_skipped: usize,
    pub folders_failed: usize,
    pub records: usize,
}

type JsonObject = Map<String, Value>;

/// Records of a chunk object; a chunk without a `data` array has none.
fn chunk_records(chunk: &JsonObject) -> &[Value] {
    chunk
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn boundary_time(chunk: &JsonObject, last: bool) -> Option<Value> {
    let records = chunk_records(chunk);
    let record = if last {
        records.last()
    } else {
        records.first()
    }?;
    record.get("time").cloned()
}

/// Rewrites every chunk of one case folder and updates its index.
///
/// Record `k` (counted across chunks in file order, over the chunks that
/// exist) gets `start_date + k` minutes. Missing chunk files are skipped.
///
/// # Errors
///
/// Returns [`ConvertError::MissingIndex`] when the folder has no
/// `index.json`, and I/O or JSON errors for unreadable or unwritable files.
pub fn rewrite_folder(
    folder: &Path,
    start_date: NaiveDate,
    season: Season,
) -> Result<RewriteReport, ConvertError> {
    let index_file = index_path(folder);
    if !index_file.exists() {
        return Err(ConvertError::MissingIndex(folder.to_path_buf()));
    }
    let mut index: JsonObject = read_json(&index_file)?;

    let num_chunks = index
        .get("numChunks")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let chunk_size = index
        .get("chunkSize")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_CHUNK_SIZE as u64);
    info!("  chunks to process: {num_chunks} (chunk size {chunk_size})");

    let mut report = RewriteReport {
        chunks_expected: num_chunks,
        ..RewriteReport::default()
    };
    let mut global_minute = 0_usize;

    for i in 0..num_chunks {
        let path = chunk_path(folder, i);
        if !path.exists() {
            warn!("  missing chunk file, skipped: {}", path.display());
            continue;
        }

        let mut chunk: JsonObject = read_json(&path)?;
        if let Some(records) = chunk.get_mut("data").and_then(Value::as_array_mut) {
            for record in records {
                if let Some(obj) = record.as_object_mut() {
                    obj.insert(
                        "time".to_string(),
                        Value::from(minute_offset_time(start_date, global_minute)),
                    );
                }
                global_minute += 1;
            }
        } else {
            warn!("  chunk without a data array: {}", path.display());
        }
        write_json(&path, &chunk)?;
        report.chunks_rewritten += 1;

        let done = i + 1;
        if done % 10 == 0 || done == num_chunks {
            let pct = done as f64 / num_chunks as f64 * 100.0;
            info!("  progress: {done}/{num_chunks} ({pct:.1}%)");
        }
    }
    report.records = global_minute;

    if num_chunks > 0 {
        let first = chunk_path(folder, 0);
        if first.exists() {
            if let Some(t) = boundary_time(&read_json(&first)?, false) {
                index.insert("startTime".to_string(), t);
            }
        }
        let last = chunk_path(folder, num_chunks - 1);
        if last.exists() {
            if let Some(t) = boundary_time(&read_json(&last)?, true) {
                index.insert("endTime".to_string(), t);
            }
        }
    }
    index.insert("season".to_string(), Value::from(season.as_str()));
    index.insert(
        "startDate".to_string(),
        Value::from(start_date.format(DATE_FORMAT).to_string()),
    );
    write_json(&index_file, &index)?;

    Ok(report)
}

/// Rewrites every folder of the configured batch table.
///
/// Missing folders and folders without an index are skipped with a warning;
/// a folder that fails part way is logged and the batch continues.
pub fn rewrite_all(rewrite: &RewriteConfig) -> RewriteSummary {
    let mut summary = RewriteSummary::default();

    for entry in &rewrite.folders {
        let folder = rewrite.base_dir.join(&entry.name);
        if !folder.is_dir() {
            warn!("folder not found, skipped: {}", entry.name);
            summary.folders_skipped += 1;
            continue;
        }

        info!(
            "rewriting {} ({}), start date {}",
            entry.name, entry.season, entry.start_date
        );
        match rewrite_folder(&folder, entry.start_date, entry.season) {
            Ok(report) => {
                info!(
                    "  done: {} records in {}/{} chunks",
                    report.records, report.chunks_rewritten, report.chunks_expected
                );
                summary.folders_rewritten += 1;
                summary.records += report.records;
            }
            Err(ConvertError::MissingIndex(dir)) => {
                warn!("  index.json not found, skipped: {}", dir.display());
                summary.folders_skipped += 1;
            }
            Err(e) => {
                error!("  failed to rewrite {}: {e}", entry.name);
                summary.folders_failed += 1;
            }
        }
    }

    summary
}
