//! Spreadsheet sheets of simulation results.
//!
//! A sheet's first row is its header. Known source columns are renamed to
//! their canonical names, every value gets one JSON type per column, and the
//! time column is replaced by a one-minute sequence starting at the season's
//! start date.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::NaiveDate;
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;
use tracing::warn;

use crate::config::SeasonConfig;
use crate::error::ConvertError;
use crate::index::FrameRow;
use crate::record::{Season, TIME_FORMAT, minute_offset_time};

/// Source header to canonical column name, in output order.
pub const COLUMN_MAP: [(&str, &str); 8] = [
    ("TIME", "time"),
    ("T_external", "T_external"),
    ("T_air_test_cell", "T_air_test"),
    ("T_air_ref_cell", "T_air_ref"),
    ("Qsens_test_cell(kJ/h)", "Qsens_test"),
    ("Qsens_ref_cell(kJ/h)", "Qsens_ref"),
    ("Tset", "Tset"),
    ("tname", "timestamp"),
];

/// JSON type chosen for a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
}

/// One output row: canonical column names with their normalized values.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    cells: Vec<(&'static str, Value)>,
}

impl SheetRow {
    /// Value of a canonical column, if the sheet has it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
    }
}

impl Serialize for SheetRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl FrameRow for SheetRow {
    fn time(&self) -> Option<&str> {
        self.get("time").and_then(Value::as_str)
    }

    fn qsens_test(&self) -> Option<f64> {
        self.get("Qsens_test").and_then(Value::as_f64)
    }

    fn qsens_ref(&self) -> Option<f64> {
        self.get("Qsens_ref").and_then(Value::as_f64)
    }
}

/// A sheet after renaming, type normalization and time synthesis.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub name: String,
    pub season: Season,
    pub start_date: NaiveDate,
    /// Canonical columns present in the sheet, with their inferred kinds.
    pub columns: Vec<(&'static str, ColumnKind)>,
    /// Expected source headers the sheet lacks.
    pub missing: Vec<&'static str>,
    pub rows: Vec<SheetRow>,
}

impl ParsedSheet {
    /// Whether a canonical column survived parsing.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| *name == column)
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn is_missing(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::Float(f) => !f.is_finite(),
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn integral(f: f64) -> Option<i64> {
    // Bounds keep the cast exact.
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

/// Infers one kind for a column of raw cells.
///
/// Any text or date cell makes the column textual. Otherwise numbers form an
/// integer column when all are whole and none is missing, else a float
/// column. A column of booleans with no gaps stays boolean.
pub fn infer_kind(cells: &[Data]) -> ColumnKind {
    let mut any_missing = false;
    let mut any_number = false;
    let mut any_bool = false;
    let mut all_integral = true;

    for cell in cells {
        if is_missing(cell) {
            any_missing = true;
            continue;
        }
        match cell {
            Data::Int(_) => any_number = true,
            Data::Float(f) => {
                any_number = true;
                all_integral &= integral(*f).is_some();
            }
            Data::Bool(_) => any_bool = true,
            _ => return ColumnKind::Text,
        }
    }

    match (any_bool, any_number) {
        (true, true) => ColumnKind::Text,
        (true, false) if any_missing => ColumnKind::Text,
        (true, false) => ColumnKind::Boolean,
        (false, _) if any_missing || !all_integral => ColumnKind::Float,
        (false, _) => ColumnKind::Integer,
    }
}

/// Whole floats print as integers (`2`), others in shortest form (`1.5`).
fn float_text(f: f64) -> String {
    integral(f).map_or_else(|| f.to_string(), |i| i.to_string())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::from(0.0), Value::Number)
}

/// Normalizes one cell for a column of `kind`; missing values become zero.
pub fn normalize_cell(cell: &Data, kind: ColumnKind) -> Value {
    if is_missing(cell) {
        return match kind {
            ColumnKind::Text => Value::from("0"),
            ColumnKind::Integer => Value::from(0),
            ColumnKind::Float => Value::from(0.0),
            ColumnKind::Boolean => Value::from(false),
        };
    }
    match (kind, cell) {
        (ColumnKind::Text, c) => Value::from(cell_text(c)),
        (ColumnKind::Integer, Data::Int(i)) => Value::from(*i),
        (ColumnKind::Integer, Data::Float(f)) => {
            integral(*f).map_or_else(|| float_value(*f), Value::from)
        }
        (ColumnKind::Float, Data::Int(i)) => float_value(*i as f64),
        (ColumnKind::Float, Data::Float(f)) => float_value(*f),
        (ColumnKind::Boolean, Data::Bool(b)) => Value::from(*b),
        (_, c) => Value::from(cell_text(c)),
    }
}

/// Parses the rows of one sheet (header first).
///
/// Missing expected columns are logged and left out of the output; the
/// columns that are present are still processed.
pub fn parse_sheet<'a, I>(name: &str, rows: I, seasons: &SeasonConfig) -> ParsedSheet
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let season = Season::from_name(name);
    let start_date = seasons.start_of(season);

    let mut rows = rows.into_iter();
    let header: Vec<String> = rows
        .next()
        .map(|h| h.iter().map(header_text).collect())
        .unwrap_or_default();

    let mut selected: Vec<(&'static str, usize)> = Vec::new();
    let mut missing = Vec::new();
    for (source, canonical) in COLUMN_MAP {
        match header.iter().position(|h| h == source) {
            Some(idx) => selected.push((canonical, idx)),
            None => missing.push(source),
        }
    }
    if !missing.is_empty() {
        warn!(sheet = name, "missing expected columns: {missing:?}");
    }

    let mut raw: Vec<Vec<Data>> = vec![Vec::new(); selected.len()];
    let mut row_count = 0_usize;
    for row in rows {
        for (col, (_, idx)) in raw.iter_mut().zip(&selected) {
            col.push(row.get(*idx).cloned().unwrap_or(Data::Empty));
        }
        row_count += 1;
    }

    let mut columns = Vec::with_capacity(selected.len());
    let mut values: Vec<Vec<Value>> = Vec::with_capacity(selected.len());
    for ((canonical, _), cells) in selected.iter().zip(&raw) {
        if *canonical == "time" {
            // Source TIME values are discarded in favor of positional minutes.
            columns.push((*canonical, ColumnKind::Text));
            values.push(
                (0..row_count)
                    .map(|i| Value::from(minute_offset_time(start_date, i)))
                    .collect(),
            );
            continue;
        }
        let kind = infer_kind(cells);
        columns.push((*canonical, kind));
        values.push(cells.iter().map(|c| normalize_cell(c, kind)).collect());
    }

    let mut iters: Vec<_> = values.into_iter().map(Vec::into_iter).collect();
    let rows = (0..row_count)
        .map(|_| SheetRow {
            cells: columns
                .iter()
                .zip(iters.iter_mut())
                .map(|((name, _), it)| (*name, it.next().unwrap_or(Value::Null)))
                .collect(),
        })
        .collect();

    ParsedSheet {
        name: name.to_string(),
        season,
        start_date,
        columns,
        missing,
        rows,
    }
}

/// An open workbook of any format calamine understands.
pub struct Workbook {
    path: std::path::PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    /// Opens the workbook at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Workbook`] if the file cannot be opened or
    /// is not a supported workbook.
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let sheets = open_workbook_auto(path).map_err(|source| ConvertError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Reads and parses one named sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::SheetNotFound`] for an unknown sheet and
    /// [`ConvertError::Workbook`] if the sheet cannot be read.
    pub fn read_sheet(
        &mut self,
        name: &str,
        seasons: &SeasonConfig,
    ) -> Result<ParsedSheet, ConvertError> {
        if !self.sheet_names().iter().any(|s| s == name) {
            return Err(ConvertError::SheetNotFound(name.to_string()));
        }
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|source| ConvertError::Workbook {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_sheet(name, range.rows(), seasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn sheet(rows: &[Vec<Data>], name: &str) -> ParsedSheet {
        parse_sheet(name, rows.iter().map(Vec::as_slice), &SeasonConfig::default())
    }

    fn full_header() -> Vec<Data> {
        COLUMN_MAP.iter().map(|(src, _)| s(&format!(" {src} "))).collect()
    }

    #[test]
    fn renames_and_synthesizes_time() {
        let rows = vec![
            full_header(),
            vec![
                Data::Float(0.25),
                Data::Float(31.5),
                Data::Float(24.0),
                Data::Float(25.0),
                Data::Float(-1200.5),
                Data::Float(-900.0),
                Data::Float(26.0),
                s("step-1"),
            ],
            vec![
                Data::Float(0.5),
                Data::Float(31.0),
                Data::Float(24.5),
                Data::Float(25.5),
                Data::Float(-1100.0),
                Data::Float(-950.0),
                Data::Float(26.0),
                s("step-2"),
            ],
        ];
        let parsed = sheet(&rows, "Case 1 Summer");
        assert_eq!(parsed.season, Season::Summer);
        assert!(parsed.missing.is_empty());
        assert_eq!(parsed.rows.len(), 2);

        let json = serde_json::to_string(&parsed.rows[1]).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"time":"2025-08-01 00:01:00","T_external":31.0,"T_air_test":24.5,"T_air_ref":25.5,"Qsens_test":-1100.0,"Qsens_ref":-950,"Tset":26,"timestamp":"step-2"}"#
        );
        assert_eq!(parsed.rows[0].time(), Some("2025-08-01 00:00:00"));
        assert_eq!(parsed.rows[0].qsens_test(), Some(-1200.5));
    }

    #[test]
    fn winter_sheet_starts_in_january() {
        let rows = vec![vec![s("TIME")], vec![Data::Float(7.0)]];
        let parsed = sheet(&rows, "Ref_Winter");
        assert_eq!(parsed.season, Season::Winter);
        assert_eq!(parsed.rows[0].time(), Some("2025-01-01 00:00:00"));
    }

    #[test]
    fn missing_columns_reported_but_rest_processed() {
        let rows = vec![
            vec![s("Qsens_test_cell(kJ/h)"), s("Unrelated")],
            vec![Data::Float(5.0), s("x")],
        ];
        let parsed = sheet(&rows, "Case2");
        assert_eq!(parsed.missing.len(), 7);
        assert!(parsed.missing.contains(&"TIME"));
        assert_eq!(parsed.columns, vec![("Qsens_test", ColumnKind::Integer)]);
        assert_eq!(serde_json::to_string(&parsed.rows[0]).unwrap_or_default(), r#"{"Qsens_test":5}"#);
        assert_eq!(parsed.rows[0].time(), None);
    }

    #[test]
    fn missing_values_become_zero() {
        let rows = vec![
            vec![s("T_external"), s("Tset"), s("tname")],
            vec![Data::Float(1.0), Data::Float(20.0), s("a")],
            vec![Data::Empty, Data::Float(21.0), Data::Empty],
            vec![Data::Float(2.5)],
        ];
        let parsed = sheet(&rows, "Case3");
        assert_eq!(
            parsed.columns,
            vec![
                ("T_external", ColumnKind::Float),
                ("Tset", ColumnKind::Float),
                ("timestamp", ColumnKind::Text),
            ]
        );
        assert_eq!(parsed.rows[1].get("T_external"), Some(&Value::from(0.0)));
        assert_eq!(parsed.rows[2].get("Tset"), Some(&Value::from(0.0)));
        assert_eq!(parsed.rows[2].get("timestamp"), Some(&Value::from("0")));
    }

    #[test]
    fn kind_inference() {
        assert_eq!(infer_kind(&[Data::Float(1.0), Data::Int(2)]), ColumnKind::Integer);
        assert_eq!(infer_kind(&[Data::Float(1.0), Data::Float(2.5)]), ColumnKind::Float);
        assert_eq!(infer_kind(&[Data::Float(1.0), Data::Empty]), ColumnKind::Float);
        assert_eq!(infer_kind(&[Data::Float(1.0), s("x")]), ColumnKind::Text);
        assert_eq!(infer_kind(&[Data::Bool(true), Data::Bool(false)]), ColumnKind::Boolean);
        assert_eq!(infer_kind(&[Data::Bool(true), Data::Float(1.0)]), ColumnKind::Text);
        assert_eq!(infer_kind(&[]), ColumnKind::Integer);
        assert_eq!(infer_kind(&[Data::Empty]), ColumnKind::Float);
    }

    #[test]
    fn text_column_stringifies_numbers() {
        assert_eq!(normalize_cell(&Data::Float(2.0), ColumnKind::Text), Value::from("2"));
        assert_eq!(normalize_cell(&Data::Float(-40.0), ColumnKind::Text), Value::from("-40"));
        assert_eq!(normalize_cell(&Data::Float(1.5), ColumnKind::Text), Value::from("1.5"));
        assert_eq!(normalize_cell(&Data::Int(3), ColumnKind::Text), Value::from("3"));
        assert_eq!(normalize_cell(&Data::Bool(true), ColumnKind::Text), Value::from("True"));
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        let parsed = sheet(&[], "Empty Summer");
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.missing.len(), COLUMN_MAP.len());
    }
}
