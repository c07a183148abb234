//! HTML report rendering

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::{self, Write};
use std::path::Path;

use super::{escape_markup, write_report};
use crate::models::{CaseReport, RunSummary};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; }
        h1 { color: #333; }
        .stats { background: #f8f8f8; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th { background-color: #f2f2f2; text-align: left; }
        td, th { padding: 12px; border: 1px solid #ddd; }
        pre { white-space: pre-wrap; word-wrap: break-word; max-height: 200px; overflow-y: auto; }
        .pass { background-color: #e8f5e9; }
        .fail { background-color: #ffebee; }
        .status-pass { color: #2e7d32; }
        .status-fail { color: #c62828; }"#;

/// Render the run as a standalone HTML page
pub fn render_html(summary: &RunSummary, generated_at: DateTime<Local>) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = write_page(&mut output, summary, generated_at);
    output
}

fn write_page(out: &mut String, summary: &RunSummary, generated_at: DateTime<Local>) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>\n<head>\n    <meta charset=\"utf-8\">")?;
    writeln!(out, "    <title>Webhook Test Report</title>")?;
    writeln!(out, "    <style>{STYLE}\n    </style>\n</head>\n<body>")?;
    writeln!(out, "    <h1>Webhook Test Report</h1>")?;

    writeln!(out, "    <div class=\"stats\">")?;
    writeln!(
        out,
        "        <p><strong>Execution Time:</strong> {}</p>",
        generated_at.format("%a, %d %b %Y %H:%M:%S %Z")
    )?;
    writeln!(out, "        <p><strong>Total Tests:</strong> {}</p>", summary.total)?;
    writeln!(
        out,
        "        <p><strong>Passed:</strong> {} ({:.1}%)</p>",
        summary.passed,
        summary.pass_rate()
    )?;
    writeln!(out, "        <p><strong>Failed:</strong> {}</p>", summary.failed)?;
    writeln!(
        out,
        "        <p><strong>Duration:</strong> {}ms</p>",
        summary.total_duration_ms
    )?;
    writeln!(out, "    </div>")?;

    writeln!(out, "    <table>")?;
    writeln!(
        out,
        "        <tr><th>Test Name</th><th>Status</th><th>Code</th><th>Delivery</th><th>Message</th><th>Response</th></tr>"
    )?;
    for case in &summary.cases {
        write_row(out, case)?;
    }
    writeln!(out, "    </table>\n</body>\n</html>")
}

fn write_row(out: &mut String, case: &CaseReport) -> fmt::Result {
    let (row_class, status) = if case.passed() {
        ("pass", "<span class='status-pass'>PASS</span>")
    } else {
        ("fail", "<span class='status-fail'>FAIL</span>")
    };
    let delivery = match &case.delivery {
        Some(d) if d.matched => format!(
            "matched {}",
            escape_markup(d.message_id.as_deref().unwrap_or_default())
        ),
        Some(_) => "missing".to_string(),
        None => "-".to_string(),
    };

    writeln!(out, "        <tr class=\"{row_class}\">")?;
    writeln!(
        out,
        "            <td><strong>{}</strong></td>",
        escape_markup(&case.outcome.name)
    )?;
    writeln!(out, "            <td>{status}</td>")?;
    writeln!(out, "            <td>{}</td>", case.outcome.status)?;
    writeln!(out, "            <td>{delivery}</td>")?;
    writeln!(out, "            <td>{}</td>", escape_markup(case.message()))?;
    writeln!(
        out,
        "            <td><pre>{}</pre></td>",
        escape_markup(&case.outcome.response)
    )?;
    writeln!(out, "        </tr>")
}

/// Write the HTML report, creating parent directories as needed
pub fn write_html_report(summary: &RunSummary, path: impl AsRef<Path>) -> Result<()> {
    let html = render_html(summary, Local::now());
    write_report(path.as_ref(), &html).context("HTML report generation failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryCheck, ExecutionOutcome};

    fn summary() -> RunSummary {
        RunSummary::new(vec![
            CaseReport {
                outcome: ExecutionOutcome::pass("TC-001 Text Event", 200, "ok"),
                delivery: Some(DeliveryCheck {
                    matched: true,
                    token: "TC-001".to_string(),
                    message_id: Some("m-9".to_string()),
                    detail: "Delivery event received".to_string(),
                }),
                entry: None,
                duration_ms: 12,
            },
            CaseReport {
                outcome: ExecutionOutcome::status_mismatch(
                    "TC-002 <Follow>",
                    200,
                    400,
                    r#"{"error":"<bad & wrong>"}"#,
                ),
                delivery: None,
                entry: None,
                duration_ms: 8,
            },
        ])
    }

    #[test]
    fn test_render_html() {
        let html = render_html(&summary(), Local::now());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p><strong>Total Tests:</strong> 2</p>"));
        assert!(html.contains("<p><strong>Passed:</strong> 1 (50.0%)</p>"));
        assert!(html.contains("matched m-9"));
        assert!(html.contains("TC-002 &lt;Follow&gt;"));
        assert!(html.contains("{&quot;error&quot;:&quot;&lt;bad &amp; wrong&gt;&quot;}"));
        assert!(html.contains("Expected status 200 but got 400"));
        assert_eq!(html.matches("<tr class=").count(), 2);
    }

    #[test]
    fn test_write_html_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("report.html");

        write_html_report(&summary(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Webhook Test Report"));
    }
}
