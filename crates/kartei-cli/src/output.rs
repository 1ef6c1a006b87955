//! Output formatting for the CLI.

use colored::{Color, Colorize};
use kartei_pipeline::{format_hms, RunSummary, WorkPlan};
use kartei_reconciler::{ColumnFill, CombineReport, MergeReport};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Format the cards a retry run would process.
    pub fn work_plan(&self, plan: &WorkPlan) -> String {
        if plan.is_empty() {
            return self.warning("No failed cards to retry.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Batch", "Cards"]);
        for batch in &plan.batches {
            builder.push_record([batch.batch_id.clone(), batch.items.len().to_string()]);
        }
        builder.push_record(["Total".to_string(), plan.total_items().to_string()]);

        let mut out = render(builder);
        if !plan.missing.is_empty() {
            out.push('\n');
            out.push_str(&self.warning(&format!("{} image(s) not found", plan.missing.len())));
        }
        out
    }

    /// Format the result of a retry run.
    pub fn run_summary(&self, summary: &RunSummary) -> String {
        if summary.batches.is_empty() {
            return if summary.interrupted {
                self.warning("Interrupted before the first batch.")
            } else {
                self.info("Nothing was retried.")
            };
        }

        let mut builder = Builder::default();
        builder.push_record(["Batch", "Cards", "Succeeded", "Failed", "Rate", "Duration", "Fragment"]);
        for outcome in &summary.batches {
            let batch = &outcome.summary;
            builder.push_record([
                batch.batch_id.clone(),
                batch.total.to_string(),
                batch.succeeded.to_string(),
                batch.failed.to_string(),
                format!("{:.1}%", batch.success_rate()),
                format_hms(batch.duration),
                outcome
                    .fragment
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }

        let mut lines = vec![render(builder)];
        let totals = format!(
            "{} of {} card(s) recovered in {}",
            summary.succeeded(),
            summary.submitted(),
            format_hms(summary.duration)
        );
        lines.push(if summary.failed() == 0 {
            self.success(&totals)
        } else {
            self.warning(&format!("{}, {} still failing", totals, summary.failed()))
        });
        if !summary.missing.is_empty() {
            lines.push(self.warning(&format!("{} image(s) not found", summary.missing.len())));
        }
        if summary.interrupted {
            lines.push(self.error("Run interrupted; remaining batches were not started"));
        }
        lines.join("\n")
    }

    /// Format a merge report.
    pub fn merge_report(&self, report: &MergeReport) -> String {
        let mut lines = vec![report.summary(), String::new(), self.fill_table(&report.columns)];

        if report.remaining_duplicates > 0 {
            lines.push(self.error(&format!(
                "{} duplicate key(s) remain in '{}'",
                report.remaining_duplicates, report.key_column
            )));
        }
        if !report.missing_columns.is_empty() {
            lines.push(self.warning(&format!(
                "Missing columns: {}",
                report.missing_columns.join(", ")
            )));
        }
        if report.is_clean() {
            lines.push(self.success(&format!(
                "Merged dataset written to {}",
                report.output_path.display()
            )));
        }
        lines.join("\n")
    }

    /// Format a combine report.
    pub fn combine_report(&self, report: &CombineReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["File", "Rows"]);
        for file in &report.files {
            builder.push_record([
                file.path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                file.rows.to_string(),
            ]);
        }

        let mut lines = vec![render(builder), self.fill_table(&report.columns)];
        for skipped in &report.skipped {
            lines.push(self.warning(&format!(
                "Skipped {}: {}",
                skipped.path.display(),
                skipped.message
            )));
        }
        let batches = report
            .batches
            .map(|count| format!(" from {} batch(es)", count))
            .unwrap_or_default();
        lines.push(self.success(&format!(
            "{} row(s){} written to {}",
            report.total_rows,
            batches,
            report.output_path.display()
        )));
        lines.join("\n")
    }

    /// Format fill rates per column.
    pub fn fill_table(&self, columns: &[ColumnFill]) -> String {
        if columns.is_empty() {
            return self.info("No data columns.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Column", "Filled", "Rows", "Fill rate"]);
        for column in columns {
            builder.push_record([
                column.name.clone(),
                column.filled.to_string(),
                column.rows.to_string(),
                format!("{:.1}%", column.percent()),
            ]);
        }
        render(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), Color::Green)
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), Color::Red)
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), Color::Blue)
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), Color::Yellow)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: Color) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        text.color(color).to_string()
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
    use kartei_domain::{CardKey, WorkItem};
    use kartei_pipeline::{BatchOutcome, BatchPlan, BatchSummary, MissingReference};
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary() -> RunSummary {
        RunSummary {
            batches: vec![BatchOutcome {
                summary: BatchSummary {
                    batch_id: "batch_007".to_string(),
                    total: 4,
                    succeeded: 3,
                    failed: 1,
                    duration: Duration::from_secs(65),
                },
                fragment: Some(PathBuf::from("/out/csv/batch_007_RETRY.csv")),
            }],
            missing: Vec::new(),
            duration: Duration::from_secs(65),
            interrupted: false,
        }
    }

    #[test]
    fn test_run_summary_table() {
        let output = Formatter::new(false).run_summary(&summary());
        assert!(output.contains("batch_007"));
        assert!(output.contains("75.0%"));
        assert!(output.contains("batch_007_RETRY.csv"));
        assert!(output.contains("3 of 4 card(s) recovered in 0:01:05, 1 still failing"));
        assert!(!output.contains("interrupted"));
    }

    #[test]
    fn test_interrupted_summary() {
        let mut summary = summary();
        summary.interrupted = true;
        let output = Formatter::new(false).run_summary(&summary);
        assert!(output.contains("✗ Run interrupted"));
    }

    #[test]
    fn test_work_plan() {
        let plan = WorkPlan {
            batches: vec![BatchPlan {
                batch_id: "batch_001".to_string(),
                items: vec![WorkItem::new(
                    CardKey::new("batch_001", "a.jpg"),
                    PathBuf::from("img/batch_001/a.jpg"),
                )],
            }],
            missing: vec![MissingReference {
                key: CardKey::new("batch_001", "gone.jpg"),
                expected_path: None,
            }],
        };

        let output = Formatter::new(false).work_plan(&plan);
        assert!(output.contains("batch_001"));
        assert!(output.contains("Total"));
        assert!(output.contains("⚠ 1 image(s) not found"));
    }

    #[test]
    fn test_fill_table() {
        let columns = vec![ColumnFill {
            name: "Komponist".to_string(),
            filled: 3,
            rows: 4,
        }];
        let output = Formatter::new(false).fill_table(&columns);
        assert!(output.contains("Komponist"));
        assert!(output.contains("75.0%"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("w"), "⚠ w");
    }
}
