//! Console summaries printed at the end of a run.

use std::fmt;

use crate::convert::ConvertSummary;
use crate::rewrite::RewriteSummary;

impl fmt::Display for ConvertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Conversion Report ---")?;
        let frames: usize = self.converted.iter().map(|c| c.frames).sum();
        let chunks: usize = self.converted.iter().map(|c| c.chunks).sum();
        let skipped: usize = self.converted.iter().map(|c| c.skipped_rows).sum();
        let cooling: usize = self.converted.iter().map(|c| c.cooling_setpoint_rows).sum();

        for c in &self.converted {
            write!(
                f,
                "{:<24} {:>8} frames {:>5} chunks  -> {}",
                c.name,
                c.frames,
                c.chunks,
                c.folder.display()
            )?;
            if !c.missing_columns.is_empty() {
                write!(f, "  (missing: {})", c.missing_columns.join(", "))?;
            }
            writeln!(f)?;
        }
        for (name, reason) in &self.failed {
            writeln!(f, "{name:<24} FAILED: {reason}")?;
        }

        writeln!(f, "Cases converted:       {}", self.converted.len())?;
        writeln!(f, "Cases failed:          {}", self.failed.len())?;
        writeln!(f, "Total frames:          {frames} in {chunks} chunks")?;
        writeln!(f, "Rows skipped:          {skipped}")?;
        write!(f, "Cooling Tset fallback: {cooling} rows")?;
        if let Some(n) = self.manifest_entries {
            write!(f, "\nManifest entries:      {n}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RewriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Date Rewrite Report ---")?;
        writeln!(f, "Folders rewritten:     {}", self.folders_rewritten)?;
        writeln!(f, "Folders skipped:       {}", self.folders_skipped)?;
        writeln!(f, "Folders failed:        {}", self.folders_failed)?;
        write!(f, "Records retimed:       {}", self.records)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::convert::{CaseOutcome, ConvertSummary};
    use crate::rewrite::RewriteSummary;

    #[test]
    fn conversion_report_lists_cases_and_totals() {
        let summary = ConvertSummary {
            converted: vec![CaseOutcome {
                name: "Case01_Summer".to_string(),
                folder: PathBuf::from("out/case01-summer"),
                frames: 1500,
                chunks: 2,
                skipped_rows: 3,
                cooling_setpoint_rows: 0,
                missing_columns: vec!["tname".to_string()],
            }],
            failed: vec![("Case02_Winter".to_string(), "no data rows".to_string())],
            manifest_entries: Some(1),
        };
        let text = summary.to_string();
        assert!(text.starts_with("--- Conversion Report ---"));
        assert!(text.contains("Case01_Summer"));
        assert!(text.contains("(missing: tname)"));
        assert!(text.contains("Case02_Winter            FAILED: no data rows"));
        assert!(text.contains("Total frames:          1500 in 2 chunks"));
        assert!(text.contains("Rows skipped:          3"));
        assert!(text.ends_with("Manifest entries:      1"));
    }

    #[test]
    fn rewrite_report_totals() {
        let summary = RewriteSummary {
            folders_rewritten: 2,
            folders_skipped: 16,
            folders_failed: 0,
            records: 2880,
        };
        let text = summary.to_string();
        assert!(text.contains("Folders rewritten:     2"));
        assert!(text.ends_with("Records retimed:       2880"));
    }
}
