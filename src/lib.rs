//! Conversion of building simulation results into chunked JSON for a web viewer.
//!
//! Two sources are supported: tab-separated `Case_<NN>_<Season>.txt` files and
//! spreadsheet workbooks with one sheet per case. Each case becomes a folder of
//! `chunk-<i>.json` files plus an `index.json`; a `manifest.json` lists the
//! folders. [`rewrite`] re-times already converted folders in place.

pub mod chunk;
pub mod cli;
/// TOML configuration with validated defaults.
pub mod config;
pub mod convert;
pub mod error;
pub mod index;
pub mod manifest;
pub mod record;
pub mod reporting;
pub mod rewrite;
pub mod text;
pub mod workbook;
