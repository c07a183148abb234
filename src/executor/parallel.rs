//! Parallel test execution
//!
//! Fans cases out across tasks while keeping reports in declaration order.

#![allow(dead_code)]

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use super::runner::SuiteRunner;
use crate::models::{CaseReport, ExecutionOutcome, RunSummary, TestSuite};
use crate::utils::Timer;

/// Parallel suite executor
pub struct ParallelExecutor {
    runner: SuiteRunner,
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(runner: SuiteRunner, max_concurrent: usize) -> Self {
        Self {
            runner,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run every case with at most `max_concurrent` in flight
    pub async fn run(&self, suite: Arc<TestSuite>) -> Vec<CaseReport> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let handles: Vec<_> = (0..suite.test_cases.len())
            .map(|index| {
                let semaphore = semaphore.clone();
                let runner = self.runner.clone();
                let suite = suite.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await;
                    let test_case = &suite.test_cases[index];
                    debug!("Starting parallel execution of {}", test_case.name);
                    (index, runner.run_case(&suite, test_case).await)
                })
            })
            .collect();

        collect_in_order(&suite, join_all(handles).await)
    }

    pub async fn run_summary(&self, suite: Arc<TestSuite>) -> RunSummary {
        info!(
            "Running {} cases in parallel (max {} concurrent)",
            suite.test_cases.len(),
            self.max_concurrent
        );
        let timer = Timer::start("parallel suite");

        let summary = RunSummary::new(self.run(suite).await);

        info!(
            "Parallel execution completed in {}ms - Pass: {}/{} ({:.1}%)",
            timer.stop(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        summary
    }
}

/// Restore declaration order; a case whose task panicked becomes a failure
fn collect_in_order(
    suite: &TestSuite,
    joined: Vec<Result<(usize, CaseReport), JoinError>>,
) -> Vec<CaseReport> {
    let mut reports: Vec<(usize, CaseReport)> = joined
        .into_iter()
        .enumerate()
        .map(|(index, joined)| {
            joined.unwrap_or_else(|e| {
                let name = &suite.test_cases[index].name;
                error!("Test case {} aborted: {}", name, e);
                let outcome =
                    ExecutionOutcome::fail(name.as_str(), "Test execution aborted", e.to_string());
                (
                    index,
                    CaseReport {
                        outcome,
                        delivery: None,
                        entry: None,
                        duration_ms: 0,
                    },
                )
            })
        })
        .collect();

    // Sort after collection so reports follow declaration order
    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}
