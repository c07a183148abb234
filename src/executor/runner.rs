//! Suite runner
//!
//! Runs every case of a suite in declaration order and turns each outcome
//! into a report record.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::request::RequestExecutor;
use crate::http::{HttpClient, HttpError};
use crate::models::{
    CaseReport, DeliveryCheck, ExecutionOutcome, ReportEntry, ReportStatus, RunSummary, TestCase,
    TestSuite,
};
use crate::pubsub::Correlator;
use crate::qase::{CaseIdLookup, NoCaseIds};
use crate::utils::Timer;

/// Default window for a delivery event to arrive
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs webhook test suites
#[derive(Clone)]
pub struct SuiteRunner {
    executor: RequestExecutor,
    correlator: Option<Correlator>,
    delivery_timeout: Duration,
    case_ids: Arc<dyn CaseIdLookup>,
}

impl SuiteRunner {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            correlator: None,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            case_ids: Arc::new(NoCaseIds),
        }
    }

    /// Runner configured from the suite's timeout, signature header and case ids
    pub fn for_suite(suite: &TestSuite, client: HttpClient) -> Self {
        let executor = RequestExecutor::new(client).signature_header(&suite.signature_header);
        let case_ids: HashMap<String, u64> = suite.case_ids.clone();
        Self::new(executor).with_case_ids(Arc::new(case_ids))
    }

    /// Runner with a fresh client bounded by the suite's timeout
    pub fn from_suite(suite: &TestSuite) -> Result<Self, HttpError> {
        let client = HttpClient::with_timeout(Duration::from_secs(suite.timeout_secs))?;
        Ok(Self::for_suite(suite, client))
    }

    pub fn with_correlator(mut self, correlator: Correlator, timeout: Duration) -> Self {
        self.correlator = Some(correlator);
        self.delivery_timeout = timeout;
        self
    }

    pub fn with_case_ids(mut self, case_ids: Arc<dyn CaseIdLookup>) -> Self {
        self.case_ids = case_ids;
        self
    }

    /// Run one case. Failures are captured in the report, never returned.
    pub async fn run_case(&self, suite: &TestSuite, test_case: &TestCase) -> CaseReport {
        info!("Running test case: {}", test_case.name);
        let timer = Timer::start(&test_case.name);

        let outcome = self
            .executor
            .execute(&suite.base_url, test_case, &suite.credentials())
            .await;
        if !outcome.passed {
            warn!("Test failed: {} - {}", test_case.name, outcome.message);
        }

        let delivery = if test_case.await_delivery {
            self.check_delivery(test_case, &outcome).await
        } else {
            None
        };

        let mut report = CaseReport {
            outcome,
            delivery,
            entry: None,
            duration_ms: timer.stop(),
        };
        report.entry = self.report_entry(&report);
        report
    }

    async fn check_delivery(
        &self,
        test_case: &TestCase,
        outcome: &ExecutionOutcome,
    ) -> Option<DeliveryCheck> {
        let Some(correlator) = &self.correlator else {
            warn!(
                "{} awaits a delivery event but no subscription is configured",
                test_case.name
            );
            return None;
        };
        if !outcome.passed {
            debug!(
                "Skipping delivery check for {}: request did not pass",
                test_case.name
            );
            return None;
        }

        let token = test_case.match_token();
        let check = match correlator.await_event(token, self.delivery_timeout).await {
            Ok(message) => DeliveryCheck {
                matched: true,
                token: token.to_string(),
                message_id: Some(message.id),
                detail: "Delivery event received".to_string(),
            },
            Err(e) => {
                let detail = if e.is_timeout() {
                    format!("Delivery event not received: {e}")
                } else {
                    format!("Delivery check failed: {e}")
                };
                warn!("{}: {}", test_case.name, detail);
                DeliveryCheck {
                    matched: false,
                    token: token.to_string(),
                    message_id: None,
                    detail,
                }
            }
        };
        Some(check)
    }

    fn report_entry(&self, report: &CaseReport) -> Option<ReportEntry> {
        let case_id = self.case_ids.case_id(&report.outcome.name)?;
        Some(ReportEntry {
            case_id,
            status: ReportStatus::from_passed(report.passed()),
            comment: report.message().to_string(),
            time_ms: report.duration_ms,
            stacktrace: report.outcome.response.clone(),
        })
    }

    /// Run all cases sequentially in declaration order
    pub async fn run(&self, suite: &TestSuite) -> Vec<CaseReport> {
        let mut reports = Vec::with_capacity(suite.test_cases.len());
        for test_case in &suite.test_cases {
            let report = self.run_case(suite, test_case).await;
            info!("  {}", report);
            reports.push(report);
        }
        reports
    }

    /// Run all cases and summarize
    pub async fn run_summary(&self, suite: &TestSuite) -> RunSummary {
        info!("Starting test execution of {} cases", suite.test_cases.len());
        let timer = Timer::start("suite");

        let summary = RunSummary::new(self.run(suite).await);

        info!(
            "Test run completed in {}ms - Pass: {}/{} ({:.1}%)",
            timer.stop(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        summary
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{http::StatusCode, routing::post, Router};
    use std::io::Write;
    use std::time::Duration;

    use crate::models::{TestCase, TestSuite, DEFAULT_SIGNATURE_HEADER};

    /// Webhook stub: 200 for every POST, delayed when the body says "slow"
    pub async fn spawn_webhook() -> String {
        let app = Router::new().route(
            "/webhook",
            post(|body: String| async move {
                if body.contains("slow") {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                (StatusCode::OK, "ok")
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/webhook")
    }

    pub fn payload(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    pub fn suite(base_url: String, test_cases: Vec<TestCase>) -> TestSuite {
        TestSuite {
            base_url,
            tenant_id: "tenant".to_string(),
            channel_id: "channel".to_string(),
            secret: "secret".to_string(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            timeout_secs: 5,
            pubsub: None,
            case_ids: Default::default(),
            test_cases,
        }
    }
}
