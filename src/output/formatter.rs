//! Output formatters for run summaries
//!
//! Provides table, JSON, and one-line summary console output.

use clap::ValueEnum;

use crate::models::{CaseReport, RunSummary};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn format_case_row(&self, case: &CaseReport) -> String {
        let status_str = match (case.passed(), self.colorize) {
            (true, true) => "\x1b[32m✓ PASS\x1b[0m",
            (false, true) => "\x1b[31m✗ FAIL\x1b[0m",
            (true, false) => "✓ PASS",
            (false, false) => "✗ FAIL",
        };

        format!(
            "{:32} {} {:>3} [{:>6}ms] {}",
            truncate(&case.outcome.name, 32),
            status_str,
            case.outcome.status,
            case.duration_ms,
            case.message()
        )
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n══════════════════════════════════════════════════════════════════════\n");
        output.push_str("  Webhook Test Run\n");
        output.push_str("══════════════════════════════════════════════════════════════════════\n");

        for case in &summary.cases {
            output.push_str(&format!("  {}\n", self.format_case_row(case)));
        }

        output.push_str("──────────────────────────────────────────────────────────────────────\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            "  Total: {} | Pass: {} | Fail: {} | Pass Rate: {:.1}% | Duration: {}ms\n",
            summary.total,
            pass_str,
            fail_str,
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        output.push_str("══════════════════════════════════════════════════════════════════════\n");

        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}/{} passed ({:.1}%) in {}ms",
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.total_duration_ms
        )
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
