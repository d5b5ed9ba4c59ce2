//! Output formatting and persistence for reports.
//!
//! Supports text tables, JSON serialization, and CSV append. Percentages and
//! separators are formatted here only; reports carry plain fractions.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::analyzers::reports::{Report, ReportKind};

/// Number formatting for rendered tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumberStyle {
    /// `41,4%` and `4.436` instead of `41.4%` and `4,436`.
    pub decimal_comma: bool,
}

impl NumberStyle {
    pub fn percent(&self, fraction: f64, decimals: usize) -> String {
        let text = format!("{:.*}%", decimals, fraction * 100.0);
        if self.decimal_comma {
            text.replace('.', ",")
        } else {
            text
        }
    }

    pub fn count(&self, value: u64) -> String {
        let sep = if self.decimal_comma { '.' } else { ',' };
        let digits = value.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}

/// Renders a report as a plain-text table with a bar per group.
pub fn render_text(report: &Report, style: &NumberStyle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", report.title);
    let _ = writeln!(out, "{}", "-".repeat(60));

    match report.kind {
        ReportKind::ClassBalance => {
            let _ = writeln!(out, "  {:20} {:>12} {:>10}", report.key_label, "Count", "Share");
            for row in &report.rows {
                let share = row.share.unwrap_or(0.0);
                let _ = writeln!(
                    out,
                    "  {:20} {:>12} {:>10} {}",
                    row.key.to_string(),
                    style.count(row.n as u64),
                    style.percent(share, 1),
                    bar(share)
                );
            }
        }
        ReportKind::LateShareByMode => {
            let _ = writeln!(out, "  {:20} {:>12} {:>10}", report.key_label, "Late", "Share");
            for row in &report.rows {
                let share = row.share.unwrap_or(0.0);
                let _ = writeln!(
                    out,
                    "  {:20} {:>12} {:>10} {}",
                    row.key.to_string(),
                    style.count(row.late_count.unwrap_or(0)),
                    style.percent(share, 2),
                    bar(share)
                );
            }
        }
        _ => {
            let _ = writeln!(out, "  {:30} {:>10} {:>10}", report.key_label, "Records", "Late_Rate");
            for row in &report.rows {
                let rate = row.late_rate.unwrap_or(0.0);
                let _ = writeln!(
                    out,
                    "  {:30} {:>10} {:>10} {}",
                    row.key.to_string(),
                    style.count(row.n as u64),
                    style.percent(rate, 1),
                    bar(rate)
                );
            }
        }
    }
    out
}

fn bar(fraction: f64) -> String {
    "#".repeat((fraction.clamp(0.0, 1.0) * 40.0).round() as usize)
}

/// Serializes a report as pretty-printed JSON.
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    report: &'a str,
    generated_at: DateTime<Utc>,
    key: String,
    n: usize,
    late_count: Option<u64>,
    late_rate: Option<f64>,
    share: Option<f64>,
}

/// Appends every row of a [`Report`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_report(path: &str, report: &Report) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = report.rows.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in &report.rows {
        writer.serialize(CsvRow {
            report: report.kind.name(),
            generated_at: report.generated_at,
            key: row.key.to_string(),
            n: row.n,
            late_count: row.late_count,
            late_rate: row.late_rate,
            share: row.share,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::reports::ReportRow;
    use crate::analyzers::types::GroupKey;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn report() -> Report {
        Report {
            kind: ReportKind::LateRateByWarehouse,
            title: ReportKind::LateRateByWarehouse.title().to_string(),
            key_label: "Warehouse".into(),
            generated_at: Utc::now(),
            rows: vec![
                ReportRow {
                    key: GroupKey::label("A"),
                    n: 1833,
                    late_count: Some(759),
                    late_rate: Some(0.414),
                    share: None,
                },
                ReportRow {
                    key: GroupKey::label("B"),
                    n: 1833,
                    late_count: Some(729),
                    late_rate: Some(0.398),
                    share: None,
                },
            ],
        }
    }

    #[test]
    fn test_percent_styles() {
        let dot = NumberStyle::default();
        let comma = NumberStyle { decimal_comma: true };
        assert_eq!(dot.percent(0.414, 1), "41.4%");
        assert_eq!(comma.percent(0.414, 1), "41,4%");
        assert_eq!(comma.percent(0.67712, 2), "67,71%");
    }

    #[test]
    fn test_count_separators() {
        let dot = NumberStyle::default();
        let comma = NumberStyle { decimal_comma: true };
        assert_eq!(dot.count(6563), "6,563");
        assert_eq!(comma.count(4436), "4.436");
        assert_eq!(comma.count(999), "999");
        assert_eq!(dot.count(1234567), "1,234,567");
    }

    #[test]
    fn test_render_text_contains_rows() {
        let text = render_text(&report(), &NumberStyle { decimal_comma: true });
        assert!(text.contains("Late Rate by Warehouse"));
        assert!(text.contains("41,4%"));
        assert!(text.contains("39,8%"));
        assert!(text.contains("1.833"));
    }

    #[test]
    fn test_render_json_has_rows() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "late-rate-by-warehouse");
        assert_eq!(value["rows"][0]["key"], "A");
        assert_eq!(value["rows"][1]["n"], 1833);
    }

    #[test]
    fn test_append_report_writes_header_once() {
        let path = temp_path("delivery_insights_test_header.csv");
        let _ = fs::remove_file(&path);

        append_report(&path, &report()).unwrap();
        append_report(&path, &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("report,")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 reports x 2 rows
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }
}
