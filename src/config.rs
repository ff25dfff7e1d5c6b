//! TOML-based conversion configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::record::Season;

/// Rows per chunk file; one simulated day at one-minute resolution.
pub const DEFAULT_CHUNK_SIZE: usize = 1440;

/// Year assumed when text files only carry month/day/hour.
pub const DEFAULT_YEAR: i32 = 2025;

/// Top-level configuration passed into every conversion entry point.
///
/// All fields have defaults matching the stock directory layout. Load from
/// TOML with [`ConvertConfig::from_toml_file`] or use
/// [`ConvertConfig::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Rows per chunk file (must be > 0).
    pub chunk_size: usize,
    /// Calendar year for text-file timestamps.
    pub year: i32,
    /// Text case file locations.
    pub text: TextConfig,
    /// Spreadsheet workbook locations.
    pub workbook: WorkbookConfig,
    /// Season start dates.
    pub seasons: SeasonConfig,
    /// Folders handled by the date rewrite.
    pub rewrite: RewriteConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            year: DEFAULT_YEAR,
            text: TextConfig::default(),
            workbook: WorkbookConfig::default(),
            seasons: SeasonConfig::default(),
            rewrite: RewriteConfig::default(),
        }
    }
}

/// Input and output directories of the text path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Directory holding `Case_<NN>_<Season>.txt` files.
    pub input_dir: PathBuf,
    /// Directory receiving one folder per case plus `manifest.json`.
    pub output_dir: PathBuf,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("public/data/Result_file2"),
            output_dir: PathBuf::from("public/data/simulation2"),
        }
    }
}

/// Workbook path and output directory of the spreadsheet path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbookConfig {
    pub path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("public/data/simulation/Simulation_Results_All.xlsx"),
            output_dir: PathBuf::from("public/data/simulation"),
        }
    }
}

/// First day of each simulated season.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonConfig {
    pub summer_start: NaiveDate,
    pub winter_start: NaiveDate,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            summer_start: NaiveDate::from_ymd_opt(DEFAULT_YEAR, 8, 1).unwrap_or_default(),
            winter_start: NaiveDate::from_ymd_opt(DEFAULT_YEAR, 1, 1).unwrap_or_default(),
        }
    }
}

impl SeasonConfig {
    /// Start date for the given season.
    pub fn start_of(&self, season: Season) -> NaiveDate {
        match season {
            Season::Summer => self.summer_start,
            Season::Winter => self.winter_start,
        }
    }
}

/// One folder handled by the date rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteFolder {
    /// Folder name relative to [`RewriteConfig::base_dir`].
    pub name: String,
    pub start_date: NaiveDate,
    pub season: Season,
}

/// Date rewrite batch table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    pub base_dir: PathBuf,
    pub folders: Vec<RewriteFolder>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        let seasons = SeasonConfig::default();
        let stems = [
            "ref",
            "case1-plus",
            "case1",
            "case2-plus",
            "case2",
            "case3-plus",
            "case3",
            "case4-plus",
            "case4",
        ];
        let folders = stems
            .iter()
            .flat_map(|stem| {
                [Season::Summer, Season::Winter].map(|season| RewriteFolder {
                    name: format!("{stem}-{season}"),
                    start_date: seasons.start_of(season),
                    season,
                })
            })
            .collect();
        Self {
            base_dir: PathBuf::from("public/data/simulation"),
            folders,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"chunk_size"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConvertConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.chunk_size == 0 {
            errors.push(ConfigError {
                field: "chunk_size".into(),
                message: "must be > 0".into(),
            });
        }
        if NaiveDate::from_ymd_opt(self.year, 1, 1).is_none() {
            errors.push(ConfigError {
                field: "year".into(),
                message: format!("{} is outside the supported calendar range", self.year),
            });
        }
        for (i, folder) in self.rewrite.folders.iter().enumerate() {
            if folder.name.trim().is_empty() {
                errors.push(ConfigError {
                    field: format!("rewrite.folders[{i}].name"),
                    message: "must not be empty".into(),
                });
            }
        }

        errors
    }
}
