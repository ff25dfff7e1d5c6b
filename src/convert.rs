//! Conversion entry points: text cases, whole workbooks and single sheets.
//!
//! Every entry point takes the configuration explicitly and returns a
//! [`ConvertSummary`]. Row problems are logged by the parsers; a failing case
//! file or sheet is logged and recorded, and the batch continues.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunk::write_chunks;
use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::index::{CaseIndex, FrameRow, IndexMeta};
use crate::manifest::{Manifest, folder_name_for_sheet};
use crate::record::DATE_FORMAT;
use crate::text::{CaseId, parse_case_file, parse_case_file_name};
use crate::workbook::Workbook;

/// Result of converting one case file or sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    /// Case or sheet name as written to `sheetName`.
    pub name: String,
    pub folder: PathBuf,
    pub frames: usize,
    pub chunks: usize,
    /// Text rows dropped as unparseable.
    pub skipped_rows: usize,
    /// Text rows where a zero heating setpoint was replaced by the cooling one.
    pub cooling_setpoint_rows: usize,
    /// Expected spreadsheet columns that were absent.
    pub missing_columns: Vec<String>,
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub converted: Vec<CaseOutcome>,
    /// `(name, reason)` for each case or sheet that produced no output.
    pub failed: Vec<(String, String)>,
    /// Entries in the manifest written by this run, if one was written.
    pub manifest_entries: Option<usize>,
}

/// Writes chunk files and `index.json` for one case.
fn write_case<R: Serialize + FrameRow>(
    dir: &Path,
    rows: &[R],
    meta: &IndexMeta<'_>,
) -> Result<CaseIndex, ConvertError> {
    info!("  total rows: {}", rows.len());
    write_chunks(dir, rows, meta.chunk_size)?;
    let index = CaseIndex::build(rows, meta);
    index.write(dir)?;
    Ok(index)
}

/// Converts one text case file into `output_dir/<case folder>`.
///
/// Returns `Ok(None)` when the file holds no usable rows; nothing is written
/// in that case.
///
/// # Errors
///
/// Returns a `ConvertError` if the file cannot be read or output cannot be written.
pub fn convert_case_file(
    path: &Path,
    id: &CaseId,
    output_dir: &Path,
    cfg: &ConvertConfig,
) -> Result<Option<CaseOutcome>, ConvertError> {
    info!("converting {}", path.display());
    let parsed = parse_case_file(path, cfg.year)?;
    if parsed.records.is_empty() {
        warn!("no data found in {}", path.display());
        return Ok(None);
    }
    if parsed.cooling_setpoint_rows > 0 {
        info!(
            "  {} rows had a zero heating setpoint; Tset took the cooling setpoint",
            parsed.cooling_setpoint_rows
        );
    }

    let name = id.display_name();
    let folder = output_dir.join(id.folder_name());
    let meta = IndexMeta::for_records(&name, id.season, cfg.chunk_size);
    let index = write_case(&folder, &parsed.records, &meta)?;
    info!(
        "  converted {} records into {} chunks",
        index.total_frames, index.num_chunks
    );

    Ok(Some(CaseOutcome {
        name,
        folder,
        frames: index.total_frames,
        chunks: index.num_chunks,
        skipped_rows: parsed.skipped_rows,
        cooling_setpoint_rows: parsed.cooling_setpoint_rows,
        missing_columns: Vec::new(),
    }))
}

/// `Case_*.txt` files directly inside `dir`, sorted by file name.
fn case_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))? {
        let path = entry.map_err(|e| ConvertError::io(dir, e))?.path();
        let is_case = path.is_file()
            && path.extension().is_some_and(|ext| ext == "txt")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("Case_"));
        if is_case {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every text case file, then rescans the output for the manifest.
///
/// # Errors
///
/// A missing input directory or an input directory without case files is
/// fatal, as is failure to create the output directory or write the
/// manifest. Individual case failures are logged and recorded in the summary.
pub fn convert_text_cases(cfg: &ConvertConfig) -> Result<ConvertSummary, ConvertError> {
    let input_dir = &cfg.text.input_dir;
    let output_dir = &cfg.text.output_dir;
    if !input_dir.is_dir() {
        return Err(ConvertError::MissingInputDir(input_dir.clone()));
    }
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;

    let files = case_files(input_dir)?;
    if files.is_empty() {
        return Err(ConvertError::NoCaseFiles(input_dir.clone()));
    }
    info!("found {} case files", files.len());

    let mut summary = ConvertSummary::default();
    for path in files {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let Some(id) = parse_case_file_name(&stem) else {
            warn!("skipping invalid file name: {stem}");
            continue;
        };
        match convert_case_file(&path, &id, output_dir, cfg) {
            Ok(Some(outcome)) => summary.converted.push(outcome),
            Ok(None) => summary
                .failed
                .push((id.display_name(), "no data rows".to_string())),
            Err(e) => {
                error!("failed to convert {}: {e}", path.display());
                summary.failed.push((id.display_name(), e.to_string()));
            }
        }
    }
    info!("conversion complete: {} files converted", summary.converted.len());

    let manifest = Manifest::scan(output_dir)?;
    manifest.write(output_dir)?;
    summary.manifest_entries = Some(manifest.total_sheets);
    Ok(summary)
}

/// Converts one sheet of an open workbook into `output_dir/<sheet folder>`.
///
/// # Errors
///
/// Returns a `ConvertError` if the sheet is missing, unreadable, or its output
/// cannot be written.
pub fn convert_sheet(
    workbook: &mut Workbook,
    sheet: &str,
    output_dir: &Path,
    cfg: &ConvertConfig,
) -> Result<CaseOutcome, ConvertError> {
    let folder_name = folder_name_for_sheet(sheet);
    let folder = output_dir.join(&folder_name);
    info!("processing {sheet} -> {folder_name}/");

    let parsed = workbook.read_sheet(sheet, &cfg.seasons)?;
    info!("  season: {}, start {}", parsed.season, parsed.start_date);

    let start_date = parsed.start_date.format(DATE_FORMAT).to_string();
    let meta = IndexMeta {
        name: sheet,
        season: parsed.season,
        chunk_size: cfg.chunk_size,
        start_date: Some(start_date),
        has_time: parsed.has_column("time"),
        has_energy: (
            parsed.has_column("Qsens_test"),
            parsed.has_column("Qsens_ref"),
        ),
    };
    let index = write_case(&folder, &parsed.rows, &meta)?;
    info!("  done: {}/", folder.display());

    Ok(CaseOutcome {
        name: sheet.to_string(),
        folder,
        frames: index.total_frames,
        chunks: index.num_chunks,
        skipped_rows: 0,
        cooling_setpoint_rows: 0,
        missing_columns: parsed.missing.iter().map(|s| s.to_string()).collect(),
    })
}

/// Converts every sheet of the configured workbook and writes its manifest.
///
/// # Errors
///
/// Failing to open the workbook or to write the manifest is fatal; a failing
/// sheet is logged and the remaining sheets are still converted.
pub fn convert_workbook(cfg: &ConvertConfig) -> Result<ConvertSummary, ConvertError> {
    let mut workbook = Workbook::open(&cfg.workbook.path)?;
    let sheets = workbook.sheet_names();
    info!("found {} sheets: {sheets:?}", sheets.len());

    let output_dir = &cfg.workbook.output_dir;
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;

    let mut summary = ConvertSummary::default();
    for sheet in &sheets {
        match convert_sheet(&mut workbook, sheet, output_dir, cfg) {
            Ok(outcome) => summary.converted.push(outcome),
            Err(e) => {
                error!("failed to process sheet {sheet}: {e:?}");
                summary.failed.push((sheet.clone(), e.to_string()));
            }
        }
    }

    let manifest = Manifest::from_sheets(&sheets);
    manifest.write(output_dir)?;
    summary.manifest_entries = Some(manifest.total_sheets);
    Ok(summary)
}

/// Converts a single named sheet of the configured workbook.
///
/// The manifest is left untouched.
///
/// # Errors
///
/// Returns a `ConvertError` if the workbook or the sheet cannot be processed.
pub fn convert_single_sheet(
    cfg: &ConvertConfig,
    sheet: &str,
) -> Result<ConvertSummary, ConvertError> {
    let mut workbook = Workbook::open(&cfg.workbook.path)?;
    let outcome = convert_sheet(&mut workbook, sheet, &cfg.workbook.output_dir, cfg)?;
    Ok(ConvertSummary {
        converted: vec![outcome],
        ..ConvertSummary::default()
    })
}

/// Rescans the text output directory and rewrites its manifest.
///
/// # Errors
///
/// Returns a `ConvertError` if the directory cannot be listed or the manifest
/// cannot be written.
pub fn regenerate_manifest(cfg: &ConvertConfig) -> Result<Manifest, ConvertError> {
    let output_dir = &cfg.text.output_dir;
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    let manifest = Manifest::scan(output_dir)?;
    manifest.write(output_dir)?;
    Ok(manifest)
}
