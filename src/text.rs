//! Tab-separated simulation case files.
//!
//! Each data row carries a raw time label, seven numeric columns and a
//! month/day/fractional-hour triple. Rows that cannot be read are logged and
//! skipped; a bad row never aborts the file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::error::ConvertError;
use crate::record::{Record, Season, format_time};

/// Minimum number of tab-separated fields in a data row.
pub const MIN_FIELDS: usize = 11;

/// Characters of an offending row quoted in warnings.
const EXCERPT_LEN: usize = 100;

/// Case number and season parsed from a `Case_<NN>_<Season>` file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseId {
    pub number: String,
    pub season: Season,
}

impl CaseId {
    /// Case number left-padded with zeros to two digits.
    fn padded_number(&self) -> String {
        format!("{:0>2}", self.number)
    }

    /// Output folder name, e.g. `case01-summer`.
    pub fn folder_name(&self) -> String {
        format!("case{}-{}", self.padded_number(), self.season)
    }

    /// Human-readable case name, e.g. `Case01_Summer`.
    pub fn display_name(&self) -> String {
        format!("Case{}_{}", self.padded_number(), self.season.title())
    }
}

/// Parses a case file stem such as `Case_01_Summer`.
///
/// Anything after the season word is ignored. Returns `None` when the stem
/// does not follow the `Case_<digits>_<Summer|Winter>` pattern.
///
/// # Examples
///
/// ```
/// use simdata::record::Season;
/// use simdata::text::parse_case_file_name;
///
/// let id = parse_case_file_name("Case_3_Winter").unwrap();
/// assert_eq!(id.season, Season::Winter);
/// assert_eq!(id.folder_name(), "case03-winter");
/// assert!(parse_case_file_name("Notes").is_none());
/// ```
pub fn parse_case_file_name(stem: &str) -> Option<CaseId> {
    let rest = stem.strip_prefix("Case_")?;
    let (number, season) = rest.split_once('_')?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let season = if season.starts_with("Summer") {
        Season::Summer
    } else if season.starts_with("Winter") {
        Season::Winter
    } else {
        return None;
    };
    Some(CaseId {
        number: number.to_string(),
        season,
    })
}

/// Rows read from one case file plus what had to be skipped or patched.
#[derive(Debug, Default)]
pub struct ParsedCase {
    pub records: Vec<Record>,
    /// Data rows dropped because they were short or unparseable.
    pub skipped_rows: usize,
    /// Rows whose heating setpoint was exactly zero and therefore took the
    /// cooling setpoint as `Tset`.
    pub cooling_setpoint_rows: usize,
}

/// Reason a single row was rejected.
#[derive(Debug, PartialEq)]
enum RowError {
    TooFewFields(usize),
    Number { column: usize, value: String },
    NonFinite { column: usize },
    Date,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewFields(n) => write!(f, "expected {MIN_FIELDS} fields, found {n}"),
            Self::Number { column, value } => {
                write!(f, "column {column}: \"{value}\" is not a number")
            }
            Self::NonFinite { column } => write!(f, "column {column}: value is not finite"),
            Self::Date => f.write_str("month/day/hour do not form a valid date"),
        }
    }
}

/// Converts month, day and fractional hour to a concrete date-time.
///
/// Month and day are truncated toward zero. The hour fraction becomes
/// minutes, the remaining fraction seconds, both truncated. A day past the
/// end of its month rolls over from the first of that month (July 32 is
/// August 1). When even the rollover cannot be formed, January 1 of `year`
/// at the same clock time is used; `None` only when that clock time is
/// itself invalid (hour 24 and above).
///
/// # Examples
///
/// ```
/// use simdata::text::format_date;
///
/// assert_eq!(format_date(7.0, 32.0, 0.0, 2025).unwrap().to_string(), "2025-08-01 00:00:00");
/// assert_eq!(format_date(1.0, 1.0, 13.5, 2025).unwrap().to_string(), "2025-01-01 13:30:00");
/// ```
pub fn format_date(month: f64, day: f64, hour: f64, year: i32) -> Option<NaiveDateTime> {
    let month = month.trunc();
    let day = day.trunc();
    let hour_int = hour.trunc();
    let minutes_f = (hour - hour_int) * 60.0;
    let minute = minutes_f.trunc();
    let second = ((minutes_f - minute) * 60.0).trunc();

    let (hour_int, minute, second) = (
        to_u32(hour_int)?,
        to_u32(minute)?,
        to_u32(second)?,
    );

    let direct = to_u32(month).zip(to_u32(day)).and_then(|(m, d)| {
        NaiveDate::from_ymd_opt(year, m, d)?.and_hms_opt(hour_int, minute, second)
    });
    if direct.is_some() {
        return direct;
    }

    let rolled = to_u32(month).and_then(|m| {
        let first = NaiveDate::from_ymd_opt(year, m, 1)?;
        let offset = Duration::try_days((day as i64).checked_sub(1)?)?;
        first
            .checked_add_signed(offset)?
            .and_hms_opt(hour_int, minute, second)
    });
    if rolled.is_some() {
        return rolled;
    }

    NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(hour_int, minute, second)
}

fn to_u32(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

fn parse_number(fields: &csv::StringRecord, column: usize) -> Result<f64, RowError> {
    let raw = fields.get(column).unwrap_or("").trim();
    let value: f64 = raw.parse().map_err(|_| RowError::Number {
        column,
        value: raw.to_string(),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RowError::NonFinite { column })
    }
}

/// Builds one record from a data row; the flag reports the setpoint fallback.
fn parse_row(fields: &csv::StringRecord, year: i32) -> Result<(Record, bool), RowError> {
    if fields.len() < MIN_FIELDS {
        return Err(RowError::TooFewFields(fields.len()));
    }

    let t_external = parse_number(fields, 1)?;
    let t_air_test = parse_number(fields, 2)?;
    // Columns 3 (solar gain) and 4 (sign flag) must be numeric but are not exported.
    parse_number(fields, 3)?;
    parse_number(fields, 4)?;
    let qsens_test = parse_number(fields, 5)?;
    let t_heat_set = parse_number(fields, 6)?;
    let t_cool_set = parse_number(fields, 7)?;
    let month = parse_number(fields, 8)?;
    let day = parse_number(fields, 9)?;
    let hour = parse_number(fields, 10)?;

    let time = format_date(month, day, hour, year).ok_or(RowError::Date)?;
    let cooling_fallback = t_heat_set == 0.0;

    let record = Record {
        time: format_time(time),
        t_external,
        t_air_test,
        // No reference cell in text files; mirror the test cell.
        t_air_ref: t_air_test,
        qsens_test,
        qsens_ref: qsens_test,
        tset: if cooling_fallback { t_cool_set } else { t_heat_set },
        timestamp: None,
    };
    Ok((record, cooling_fallback))
}

fn excerpt(fields: &csv::StringRecord) -> String {
    let line = fields.iter().collect::<Vec<_>>().join("\t");
    line.chars().take(EXCERPT_LEN).collect()
}

/// Parses a whole case file from any reader.
///
/// The first line is a header. Blank lines are ignored.
pub fn parse_case_text(reader: impl Read, year: i32) -> ParsedCase {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parsed = ParsedCase::default();
    for result in rdr.records() {
        let fields = match result {
            Ok(fields) => fields,
            Err(e) => {
                warn!("skipping unreadable line: {e}");
                parsed.skipped_rows += 1;
                continue;
            }
        };
        let line = fields.position().map_or(0, csv::Position::line);
        match parse_row(&fields, year) {
            Ok((record, cooling_fallback)) => {
                if cooling_fallback {
                    parsed.cooling_setpoint_rows += 1;
                }
                parsed.records.push(record);
            }
            Err(e) => {
                warn!(line, "skipping row: {}... ({e})", excerpt(&fields));
                parsed.skipped_rows += 1;
            }
        }
    }
    parsed
}

/// Opens and parses a case file.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] if the file cannot be opened. Row-level
/// problems are logged, never returned.
pub fn parse_case_file(path: &Path, year: i32) -> Result<ParsedCase, ConvertError> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(parse_case_text(std::io::BufReader::new(file), year))
}
