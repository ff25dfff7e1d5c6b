//! Output record shape, seasons, and timestamp formatting.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in every `time` field.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used for `startDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Simulation season of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    /// Season implied by a sheet or case name: any case-insensitive
    /// occurrence of `summer`, otherwise winter.
    ///
    /// # Examples
    ///
    /// ```
    /// use simdata::record::Season;
    ///
    /// assert_eq!(Season::from_name("Case1_SUMMER"), Season::Summer);
    /// assert_eq!(Season::from_name("Ref_Winter"), Season::Winter);
    /// assert_eq!(Season::from_name("Ref"), Season::Winter);
    /// ```
    pub fn from_name(name: &str) -> Self {
        if name.to_lowercase().contains("summer") {
            Self::Summer
        } else {
            Self::Winter
        }
    }

    /// Lowercase form used in folder names and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
        }
    }

    /// Capitalized form used in display names (`Summer`).
    pub fn title(self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One time-stamped observation as written to chunk files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Formatted as [`TIME_FORMAT`].
    pub time: String,
    #[serde(rename = "T_external")]
    pub t_external: f64,
    #[serde(rename = "T_air_test")]
    pub t_air_test: f64,
    #[serde(rename = "T_air_ref")]
    pub t_air_ref: f64,
    #[serde(rename = "Qsens_test")]
    pub qsens_test: f64,
    #[serde(rename = "Qsens_ref")]
    pub qsens_ref: f64,
    #[serde(rename = "Tset")]
    pub tset: f64,
    /// Raw source label, when the source carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Formats a date-time the way every output file expects it.
pub fn format_time(dt: NaiveDateTime) -> String {
    dt.format(TIME_FORMAT).to_string()
}

/// Timestamp `index` minutes after midnight of `start`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use simdata::record::minute_offset_time;
///
/// let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
/// assert_eq!(minute_offset_time(start, 0), "2025-08-01 00:00:00");
/// assert_eq!(minute_offset_time(start, 1441), "2025-08-02 00:01:00");
/// ```
pub fn minute_offset_time(start: NaiveDate, index: usize) -> String {
    let midnight = start.and_time(chrono::NaiveTime::MIN);
    format_time(midnight + Duration::minutes(index as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_canonical_names() {
        let rec = Record {
            time: "2025-01-01 00:00:00".to_string(),
            t_external: -3.5,
            t_air_test: 20.0,
            t_air_ref: 20.0,
            qsens_test: 1200.0,
            qsens_ref: 1200.0,
            tset: 20.0,
            timestamp: None,
        };
        let json = serde_json::to_string(&rec).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"time":"2025-01-01 00:00:00","T_external":-3.5,"T_air_test":20.0,"T_air_ref":20.0,"Qsens_test":1200.0,"Qsens_ref":1200.0,"Tset":20.0}"#
        );
    }

    #[test]
    fn timestamp_label_is_kept_when_present() {
        let json = r#"{"time":"t","T_external":1,"T_air_test":2,"T_air_ref":3,
            "Qsens_test":4,"Qsens_ref":5,"Tset":6,"timestamp":"label"}"#;
        let rec: Record = serde_json::from_str(json).expect("record should parse");
        assert_eq!(rec.timestamp.as_deref(), Some("label"));
        assert_eq!(rec.tset, 6.0);
    }

    #[test]
    fn season_serializes_lowercase() {
        for season in [Season::Summer, Season::Winter] {
            let json = serde_json::to_string(&season).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", season.as_str()));
            assert_eq!(season.to_string(), season.as_str());
        }
        assert!(serde_json::from_str::<Season>("\"spring\"").is_err());
    }
}
