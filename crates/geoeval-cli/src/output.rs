//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use geoeval_domain::Coordinate;
use geoeval_extractor::{OutputTable, ScanStats};
use geoeval_llm::{BatchReport, JudgeReport};
use geoeval_metrics::{ClassificationReport, DescribeReport, DistanceReport, ScoreMeans, SimilarityReport};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a CSV table (collected rows or a preview).
    pub fn format_table(&self, table: &OutputTable) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(table)?),
            OutputFormat::Table => {
                if table.is_empty() {
                    return Ok(self.colorize("No rows.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(table.headers.iter().map(String::as_str));
                for row in &table.rows {
                    builder.push_record(row.iter().map(String::as_str));
                }
                Ok(render(builder))
            }
        }
    }

    /// Format the statistics of a finished scan.
    pub fn format_scan(&self, stats: &ScanStats) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(stats)?);
        }

        let ending = if stats.stopped_early {
            "all quotas filled"
        } else if stats.cancelled {
            "cancelled"
        } else {
            "end of input"
        };
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        builder.push_record(["Records read".to_string(), stats.records_read.to_string()]);
        builder.push_record(["Records skipped".to_string(), stats.records_skipped.to_string()]);
        builder.push_record(["Payloads decoded".to_string(), stats.payloads_decoded.to_string()]);
        builder.push_record(["Rounds seen".to_string(), stats.rounds_seen.to_string()]);
        builder.push_record(["Rows kept".to_string(), stats.candidates_retained.to_string()]);
        builder.push_record(["Stopped by".to_string(), ending.to_string()]);
        builder.push_record(["Elapsed".to_string(), format!("{:.2}s", stats.elapsed_ms as f64 / 1000.0)]);

        let mut out = render(builder);
        if !stats.unfilled_keys.is_empty() {
            out.push('\n');
            out.push_str(&self.warning(&format!(
                "Below quota: {}",
                stats.unfilled_keys.join(", ")
            )));
        }
        Ok(out)
    }

    /// Format a distance report.
    pub fn format_distance(&self, report: &DistanceReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Threshold", "Within", "Proportion"]);
        for share in &report.shares {
            builder.push_record([
                format!("< {} km", share.km),
                share.within.to_string(),
                format!("{:.4}", share.proportion),
            ]);
        }
        Ok(format!("{}\n{}", render(builder), self.counts(report.evaluated, report.skipped)))
    }

    /// Format a classification report.
    pub fn format_classification(&self, report: &ClassificationReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Field", "Accuracy", "Recall", "F1"]);
        for (name, m) in [
            ("location", &report.location),
            ("country", &report.country),
            ("continent", &report.continent),
        ] {
            builder.push_record([
                name.to_string(),
                format!("{:.3}", m.accuracy),
                format!("{:.3}", m.recall),
                format!("{:.3}", m.f1_score),
            ]);
        }
        Ok(format!("{}\n{}", render(builder), self.counts(report.evaluated, report.skipped)))
    }

    /// Format a similarity report.
    pub fn format_similarity(&self, report: &SimilarityReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Mean similarity"]);
        builder.push_record([format!("{:.4}", report.mean)]);
        Ok(format!("{}\n{}", render(builder), self.counts(report.evaluated, report.skipped)))
    }

    /// Format rubric score means.
    pub fn format_means(&self, means: &ScoreMeans) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(means)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["CE", "AE", "AC", "LC"]);
        builder.push_record(means.means.iter().map(|m| format!("{:.4}", m)));
        let mut out = render(builder);
        out.push('\n');
        out.push_str(&self.info(&format!("{} file(s) averaged", means.files)));
        if means.ignored > 0 {
            out.push('\n');
            out.push_str(&self.warning(&format!("{} malformed file(s) ignored", means.ignored)));
        }
        Ok(out)
    }

    /// Format a prediction batch summary.
    pub fn format_batch(&self, report: &BatchReport) -> Result<String> {
        self.summary(report, || {
            let mut out = self.success(&format!("Predicted {} coordinate(s)", report.predicted));
            if report.skipped_existing > 0 {
                out.push('\n');
                out.push_str(&self.info(&format!("{} already predicted, skipped", report.skipped_existing)));
            }
            if report.fallbacks > 0 {
                out.push('\n');
                out.push_str(&self.warning(&format!("{} fell back to 0.0, 0.0", report.fallbacks)));
            }
            out
        })
    }

    /// Format a judging summary.
    pub fn format_judge(&self, report: &JudgeReport) -> Result<String> {
        self.summary(report, || {
            let mut out = self.success(&format!("Judged {} text(s)", report.judged));
            if report.unmatched > 0 {
                out.push('\n');
                out.push_str(&self.warning(&format!("{} without a ground truth", report.unmatched)));
            }
            if report.incomplete > 0 {
                out.push('\n');
                out.push_str(&self.warning(&format!("{} with unscored dimensions", report.incomplete)));
            }
            out
        })
    }

    /// Format a description parsing summary.
    pub fn format_describe(&self, report: &DescribeReport) -> Result<String> {
        self.summary(report, || {
            let mut out = self.success(&format!("Wrote {} location file(s)", report.written));
            if report.unmatched > 0 {
                out.push('\n');
                out.push_str(&self.warning(&format!("{} description(s) did not match", report.unmatched)));
            }
            out
        })
    }

    /// Format a geocoded coordinate.
    pub fn format_coordinate(&self, query: &str, coordinate: Coordinate) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "query": query,
                "lat": coordinate.lat,
                "lng": coordinate.lng,
                "found": !coordinate.is_sentinel(),
            }))?),
            OutputFormat::Table => {
                if coordinate.is_sentinel() {
                    Ok(self.warning(&format!("{}: no location found ({})", query, coordinate)))
                } else {
                    Ok(format!("{}: {}", query, coordinate))
                }
            }
        }
    }

    /// Format a file count.
    pub fn format_count(&self, dir: &str, count: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "dir": dir,
                "count": count,
            }))?),
            OutputFormat::Table => Ok(format!("{} .txt file(s) in {}", count, dir)),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn summary<T: Serialize>(&self, report: &T, text: impl FnOnce() -> String) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(text()),
        }
    }

    fn counts(&self, evaluated: usize, skipped: usize) -> String {
        let mut out = self.info(&format!("{} pair(s) evaluated", evaluated));
        if skipped > 0 {
            out.push('\n');
            out.push_str(&self.warning(&format!("{} pair(s) skipped", skipped)));
        }
        out
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoeval_metrics::{DistanceConfig, FieldMetrics};

    fn table() -> OutputTable {
        let mut table = OutputTable::new(vec!["nation".into(), "panoID".into()]);
        table.rows.push(vec!["Canada".into(), "c1".into()]);
        table
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_table(&table()).unwrap();
        assert!(output.contains("panoID"));
        assert!(output.contains("Canada"));
    }

    #[test]
    fn test_table_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_table(&table()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["headers"][1], "panoID");
        assert_eq!(value["rows"][0][0], "Canada");
    }

    #[test]
    fn test_empty_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_table(&OutputTable::new(vec!["nation".into()]))
            .unwrap();
        assert_eq!(output, "No rows.");
    }

    #[test]
    fn test_scan_reports_unfilled_keys() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let stats = ScanStats {
            records_read: 10,
            unfilled_keys: vec!["Japan".into()],
            ..ScanStats::default()
        };
        let output = formatter.format_scan(&stats).unwrap();
        assert!(output.contains("end of input"));
        assert!(output.contains("⚠ Below quota: Japan"));
    }

    #[test]
    fn test_distance_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = DistanceReport::from_distances(&[0.5, 30.0], 1, &DistanceConfig::default());
        let output = formatter.format_distance(&report).unwrap();
        assert!(output.contains("< 25 km"));
        assert!(output.contains("0.5000"));
        assert!(output.contains("2 pair(s) evaluated"));
        assert!(output.contains("1 pair(s) skipped"));
    }

    #[test]
    fn test_classification_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let m = FieldMetrics {
            accuracy: 1.0,
            recall: 1.0,
            f1_score: 1.0,
        };
        let report = ClassificationReport {
            evaluated: 1,
            skipped: 0,
            location: m,
            country: m,
            continent: m,
        };
        let output = formatter.format_classification(&report).unwrap();
        assert!(output.contains("\"f1_score\": 1.0"));
    }

    #[test]
    fn test_similarity_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = SimilarityReport {
            evaluated: 3,
            skipped: 0,
            mean: 0.81234,
        };
        let output = formatter.format_similarity(&report).unwrap();
        assert!(output.contains("Mean similarity"));
        assert!(output.contains("0.8123"));
        assert!(output.contains("3 pair(s) evaluated"));
        assert!(!output.contains("skipped"));
    }

    #[test]
    fn test_sentinel_coordinate_is_a_warning() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_coordinate("nowhere", Coordinate::SENTINEL)
            .unwrap();
        assert_eq!(output, "⚠ nowhere: no location found (0.0, 0.0)");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("test"), "⚠ test");
    }
}
