//! Error types shared by every conversion path.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of a conversion, rewrite or manifest step.
///
/// Row-level problems never surface here; they are logged and skipped by the
/// parsers. These variants abort the unit of work they occur in (a file, a
/// sheet, a folder or the whole run).
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("i/o error on \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in \"{}\": {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read workbook \"{}\": {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet \"{0}\" not found in workbook")]
    SheetNotFound(String),
    #[error("input directory not found: {}", .0.display())]
    MissingInputDir(PathBuf),
    #[error("no case files found in {}", .0.display())]
    NoCaseFiles(PathBuf),
    #[error("index.json not found in {}", .0.display())]
    MissingIndex(PathBuf),
}

impl ConvertError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}
