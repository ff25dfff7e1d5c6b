//! Top-level `manifest.json`: display name to case folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Map;
use tracing::info;

use crate::chunk::write_json;
use crate::error::ConvertError;
use crate::record::Season;

/// File name of the top-level manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Contents of `manifest.json`.
///
/// `sheets` keeps insertion order, which is the order entries are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    pub sheets: Map<String, serde_json::Value>,
    pub total_sheets: usize,
}

/// Derives the display name of a `case<NN>-<season>` folder.
///
/// The folder must be exactly `case`, one or more digits, `-`, then `summer`
/// or `winter`; anything else yields `None`.
///
/// # Examples
///
/// ```
/// use simdata::manifest::display_name_for_folder;
///
/// assert_eq!(display_name_for_folder("case01-summer").as_deref(), Some("Case01_Summer"));
/// assert_eq!(display_name_for_folder("case7-winter").as_deref(), Some("Case07_Winter"));
/// assert_eq!(display_name_for_folder("ref-summer"), None);
/// ```
pub fn display_name_for_folder(folder: &str) -> Option<String> {
    let rest = folder.strip_prefix("case")?;
    let (number, season) = rest.split_once('-')?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let season = match season {
        "summer" => Season::Summer,
        "winter" => Season::Winter,
        _ => return None,
    };
    Some(format!("Case{number:0>2}_{}", season.title()))
}

/// Folder name for a workbook sheet.
///
/// Lowercases, then maps space and `_` to `-`, `+` to `-plus` and the minus
/// sign `−` (U+2212) to `-minus`, then collapses runs of `-` into one.
/// Distinct sheet names may map to the same folder; no collision check is
/// made.
///
/// # Examples
///
/// ```
/// use simdata::manifest::folder_name_for_sheet;
///
/// assert_eq!(folder_name_for_sheet("Case 1 + Summer"), "case-1-plus-summer");
/// assert_eq!(folder_name_for_sheet("Ref_Winter"), "ref-winter");
/// ```
pub fn folder_name_for_sheet(sheet: &str) -> String {
    let replaced = sheet
        .to_lowercase()
        .replace(' ', "-")
        .replace('_', "-")
        .replace('+', "-plus")
        .replace('\u{2212}', "-minus");

    let mut folder = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '-' && folder.ends_with('-') {
            continue;
        }
        folder.push(c);
    }
    folder
}

impl Manifest {
    /// Builds a manifest from `(display name, folder)` pairs, in order.
    ///
    /// A repeated display name keeps its first position and takes the last
    /// folder, and is counted once.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut sheets = Map::new();
        for (name, folder) in entries {
            sheets.insert(name.into(), serde_json::Value::String(folder.into()));
        }
        let total_sheets = sheets.len();
        Self {
            sheets,
            total_sheets,
        }
    }

    /// Manifest of the workbook path: each sheet name mapped to its folder.
    pub fn from_sheets<S: AsRef<str>>(sheet_names: &[S]) -> Self {
        Self::from_entries(
            sheet_names
                .iter()
                .map(|s| (s.as_ref().to_string(), folder_name_for_sheet(s.as_ref()))),
        )
    }

    /// Scans `dir` for `case<NN>-<season>` subfolders, sorted by folder name.
    ///
    /// A missing `dir` yields an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns a `ConvertError` if `dir` exists but cannot be listed.
    pub fn scan(dir: &Path) -> Result<Self, ConvertError> {
        if !dir.exists() {
            return Ok(Self::default());
        }
        let mut folders = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))? {
            let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                folders.push(name.to_string());
            }
        }
        folders.sort();

        Ok(Self::from_entries(folders.into_iter().filter_map(|folder| {
            display_name_for_folder(&folder).map(|display| (display, folder))
        })))
    }

    /// Writes `dir/manifest.json` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns a `ConvertError` if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ConvertError> {
        let path = dir.join(MANIFEST_FILE);
        write_json(&path, self)?;
        info!("manifest written with {} cases: {}", self.total_sheets, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sheet_folder_names() {
        assert_eq!(folder_name_for_sheet("Case 1 + Summer"), "case-1-plus-summer");
        assert_eq!(folder_name_for_sheet("Case1+_Winter"), "case1-plus-winter");
        assert_eq!(folder_name_for_sheet("Case2\u{2212}Summer"), "case2-minussummer");
        assert_eq!(folder_name_for_sheet("REF SUMMER"), "ref-summer");
        assert_eq!(folder_name_for_sheet("Case 2 \u{2212} Winter"), "case-2-minus-winter");
        assert_eq!(folder_name_for_sheet("Ref  __Summer"), "ref-summer");
    }

    #[test]
    fn colliding_sheet_names_share_a_folder() {
        let m = Manifest::from_sheets(&["Ref Summer", "Ref_Summer"]);
        assert_eq!(m.total_sheets, 2);
        assert_eq!(m.sheets["Ref Summer"], m.sheets["Ref_Summer"]);
    }

    #[test]
    fn folder_display_names() {
        assert_eq!(display_name_for_folder("case12-winter").as_deref(), Some("Case12_Winter"));
        assert_eq!(display_name_for_folder("case1-plus-summer"), None);
        assert_eq!(display_name_for_folder("case-summer"), None);
        assert_eq!(display_name_for_folder("caseab-summer"), None);
    }

    #[test]
    fn scan_picks_case_folders_only() -> Result<(), ConvertError> {
        let tmp = TempDir::new().map_err(|e| ConvertError::io(Path::new("tmp"), e))?;
        for name in ["case02-winter", "case01-summer", "ref-summer", "notes"] {
            fs::create_dir(tmp.path().join(name)).map_err(|e| ConvertError::io(tmp.path(), e))?;
        }
        fs::write(tmp.path().join("case03-summer"), "not a dir")
            .map_err(|e| ConvertError::io(tmp.path(), e))?;

        let m = Manifest::scan(tmp.path())?;
        assert_eq!(m.total_sheets, 2);
        let names: Vec<&str> = m.sheets.keys().map(String::as_str).collect();
        assert_eq!(names, ["Case01_Summer", "Case02_Winter"]);
        assert_eq!(m.sheets["Case02_Winter"], "case02-winter");
        Ok(())
    }

    #[test]
    fn manifest_json_shape() -> Result<(), ConvertError> {
        let tmp = TempDir::new().map_err(|e| ConvertError::io(Path::new("tmp"), e))?;
        let path = Manifest::from_entries([("Case01_Summer", "case01-summer")]).write(tmp.path())?;
        let text = fs::read_to_string(&path).map_err(|e| ConvertError::io(&path, e))?;
        assert_eq!(
            text,
            "{\n  \"sheets\": {\n    \"Case01_Summer\": \"case01-summer\"\n  },\n  \"total_sheets\": 1\n}"
        );
        Ok(())
    }

    #[test]
    fn scan_of_missing_dir_is_empty() -> Result<(), ConvertError> {
        let m = Manifest::scan(Path::new("/nonexistent/simdata/output"))?;
        assert_eq!(m, Manifest::default());
        Ok(())
    }
}
