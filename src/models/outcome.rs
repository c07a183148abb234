//! Outcome models for webhook test execution
//!
//! Defines per-case outcomes, report entries, and the run summary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message recorded for a case whose status matched
pub const PASSED_MESSAGE: &str = "Test passed";

/// Result of sending one signed request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub name: String,
    pub passed: bool,
    /// Observed HTTP status, 0 when no response was received
    pub status: u16,
    pub message: String,
    /// Raw response body or error detail
    pub response: String,
}

impl ExecutionOutcome {
    pub fn pass(name: impl Into<String>, status: u16, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            status,
            message: PASSED_MESSAGE.to_string(),
            response: response.into(),
        }
    }

    /// Failure before any response was observed
    pub fn fail(
        name: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            status: 0,
            message: message.into(),
            response: detail.into(),
        }
    }

    pub fn status_mismatch(
        name: impl Into<String>,
        expected: u16,
        actual: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            status: actual,
            message: format!("Expected status {expected} but got {actual}"),
            response: body.into(),
        }
    }
}

/// Delivery confirmation observed (or not) for a case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCheck {
    pub matched: bool,
    pub token: String,
    pub message_id: Option<String>,
    pub detail: String,
}

/// Status reported to the test-management service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
}

impl ReportStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            ReportStatus::Passed
        } else {
            ReportStatus::Failed
        }
    }
}

/// One result row for the test-management bulk upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub case_id: u64,
    pub status: ReportStatus,
    pub comment: String,
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stacktrace: String,
}

/// Everything recorded for one test case
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseReport {
    pub outcome: ExecutionOutcome,
    pub delivery: Option<DeliveryCheck>,
    pub entry: Option<ReportEntry>,
    pub duration_ms: u64,
}

impl CaseReport {
    /// HTTP outcome passed and any awaited delivery arrived
    pub fn passed(&self) -> bool {
        self.outcome.passed && self.delivery.as_ref().map_or(true, |d| d.matched)
    }

    /// Human-readable reason, preferring the delivery failure when present
    pub fn message(&self) -> &str {
        match &self.delivery {
            Some(d) if self.outcome.passed && !d.matched => &d.detail,
            _ => &self.outcome.message,
        }
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.passed() { "✓" } else { "✗" };
        write!(
            f,
            "{} {} [{}] [{}ms] - {}",
            symbol,
            self.outcome.name,
            self.outcome.status,
            self.duration_ms,
            self.message()
        )?;
        if let Some(d) = &self.delivery {
            if d.matched {
                write!(f, " (delivery matched)")?;
            }
        }
        Ok(())
    }
}

/// Summary of a full suite run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
    pub cases: Vec<CaseReport>,
}

impl RunSummary {
    pub fn new(cases: Vec<CaseReport>) -> Self {
        let total = cases.len();
        let passed = cases.iter().filter(|c| c.passed()).count();
        let total_duration_ms = cases.iter().map(|c| c.duration_ms).sum();

        Self {
            total,
            passed,
            failed: total - passed,
            total_duration_ms,
            cases,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Entries bound for the test-management service, in run order
    pub fn report_entries(&self) -> Vec<ReportEntry> {
        self.cases.iter().filter_map(|c| c.entry.clone()).collect()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Webhook Test Run")?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for case in &self.cases {
            writeln!(f, "  {case}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.total, self.passed, self.failed
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: ExecutionOutcome, delivery: Option<DeliveryCheck>) -> CaseReport {
        CaseReport {
            outcome,
            delivery,
            entry: None,
            duration_ms: 10,
        }
    }

    #[test]
    fn test_status_mismatch_message() {
        let outcome = ExecutionOutcome::status_mismatch("TC-001", 200, 404, "not found");
        assert!(!outcome.passed);
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.message, "Expected status 200 but got 404");
        assert_eq!(outcome.response, "not found");
    }

    #[test]
    fn test_missing_delivery_fails_case() {
        let delivery = DeliveryCheck {
            matched: false,
            token: "TC-001".to_string(),
            message_id: None,
            detail: "no matching message".to_string(),
        };
        let case = report(ExecutionOutcome::pass("TC-001", 200, "ok"), Some(delivery));

        assert!(!case.passed());
        assert_eq!(case.message(), "no matching message");
    }

    #[test]
    fn test_report_entry_serialization() {
        let entry = ReportEntry {
            case_id: 101,
            status: ReportStatus::Failed,
            comment: "Expected status 200 but got 500".to_string(),
            time_ms: 42,
            stacktrace: String::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["case_id"], 101);
        assert!(json.get("stacktrace").is_none());
    }

    #[test]
    fn test_run_summary() {
        let cases = vec![
            report(ExecutionOutcome::pass("a", 200, ""), None),
            report(ExecutionOutcome::fail("b", "HTTP request failed", "refused"), None),
        ];
        let summary = RunSummary::new(cases);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_duration_ms, 20);
        assert_eq!(summary.pass_rate(), 50.0);
        assert!(!summary.is_all_passed());
    }
}
