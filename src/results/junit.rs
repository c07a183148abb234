//! JUnit XML export

use anyhow::{Context, Result};
use std::fmt::{self, Write};
use std::path::Path;

use super::{escape_xml, write_report};
use crate::models::RunSummary;

const SUITE_NAME: &str = "QA Integration Tests";
const CLASS_NAME: &str = "webhook-tester";

/// Render the run as a JUnit `<testsuites>` document
pub fn render_junit(summary: &RunSummary) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = write_document(&mut output, summary);
    output
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

fn write_document(out: &mut String, summary: &RunSummary) -> fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, "<testsuites>")?;
    writeln!(
        out,
        r#"  <testsuite name="{}" tests="{}" failures="{}" time="{}">"#,
        SUITE_NAME,
        summary.total,
        summary.failed,
        seconds(summary.total_duration_ms)
    )?;

    for case in &summary.cases {
        let open = format!(
            r#"    <testcase name="{}" classname="{}" time="{}""#,
            escape_xml(&case.outcome.name),
            CLASS_NAME,
            seconds(case.duration_ms)
        );
        if case.passed() {
            writeln!(out, "{open}></testcase>")?;
            continue;
        }
        writeln!(out, "{open}>")?;
        writeln!(
            out,
            r#"      <failure message="{}" type="Failure">{}</failure>"#,
            escape_xml(case.message()),
            escape_xml(&case.outcome.response)
        )?;
        writeln!(out, "    </testcase>")?;
    }

    writeln!(out, "  </testsuite>")?;
    writeln!(out, "</testsuites>")
}

/// Write the JUnit report, creating parent directories as needed
pub fn write_junit_report(summary: &RunSummary, path: impl AsRef<Path>) -> Result<()> {
    write_report(path.as_ref(), &render_junit(summary)).context("JUnit report generation failed")
}
