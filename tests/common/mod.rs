//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use serde_json::Value;
use simdata::config::ConvertConfig;
use tempfile::TempDir;

/// Header line of a text case file.
pub const CASE_HEADER: &str =
    "TIME\tT_ext\tT_air\tQsol\tsign\tQsens\tTh_set\tTc_set\tMonth\tDay\tHour";

/// Configuration rooted in a fresh temporary directory.
///
/// Returns the directory guard with the config; the guard must outlive the test.
pub fn temp_config() -> (TempDir, ConvertConfig) {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    let mut cfg = ConvertConfig::default();
    cfg.text.input_dir = root.join("txt");
    cfg.text.output_dir = root.join("out");
    cfg.workbook.path = root.join("results.xlsx");
    cfg.workbook.output_dir = root.join("sheets");
    cfg.rewrite.base_dir = root.join("out");
    (tmp, cfg)
}

/// `n` quarter-hour rows starting at `month`/`day` 00:00.
///
/// `T_external` equals the row index and `Qsens` is ten times it. Hours past
/// midnight are carried into the day column, so the day may run past the end
/// of the month.
pub fn case_rows(n: usize, month: u32, day: u32) -> String {
    let mut text = String::new();
    writeln!(text, "{CASE_HEADER}").expect("write header");
    for i in 0..n {
        let total_hours = i as f64 * 0.25;
        let day = day as usize + (total_hours / 24.0) as usize;
        let hour = total_hours % 24.0;
        writeln!(
            text,
            "+{i}.0\t{i}\t21.5\t0\t1\t{q}\t20\t26\t{month}\t{day}\t{hour}",
            q = i * 10
        )
        .expect("write row");
    }
    text
}

/// Writes `contents` as `<input_dir>/<name>`, creating the directory.
pub fn write_case_file(cfg: &ConvertConfig, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(&cfg.text.input_dir).expect("create input dir");
    let path = cfg.text.input_dir.join(name);
    fs::write(&path, contents).expect("write case file");
    path
}

/// Writes a workbook with one sheet per `(name, rows)` pair using the
/// stock column headers. Each row is `(T_external, Qsens_test, Qsens_ref)`.
pub fn write_workbook(path: &Path, sheets: &[(&str, &[(f64, f64, f64)])]) {
    let headers = [
        "TIME",
        "T_external",
        "T_air_test_cell",
        "T_air_ref_cell",
        "Qsens_test_cell(kJ/h)",
        "Qsens_ref_cell(kJ/h)",
        "Tset",
        "tname",
    ];
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(*name).expect("set sheet name");
        for (col, h) in headers.iter().enumerate() {
            ws.write_string(0, col as u16, *h).expect("write header");
        }
        for (i, (t_ext, q_test, q_ref)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            ws.write_number(r, 0, i as f64 * 60.0).expect("write cell");
            ws.write_number(r, 1, *t_ext).expect("write cell");
            ws.write_number(r, 2, 24.5).expect("write cell");
            ws.write_number(r, 3, 25.0).expect("write cell");
            ws.write_number(r, 4, *q_test).expect("write cell");
            ws.write_number(r, 5, *q_ref).expect("write cell");
            ws.write_number(r, 6, 26.0).expect("write cell");
            ws.write_string(r, 7, format!("t{i}")).expect("write cell");
        }
    }
    workbook.save(path).expect("save workbook");
}

/// Parses a JSON file into a generic value.
pub fn read_value(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read json file");
    serde_json::from_str(&text).expect("parse json file")
}
