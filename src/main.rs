//! Webhook Tester - signed webhook conformance runner
//!
//! A CLI tool that sends HMAC-signed webhook payloads to a target service,
//! checks the HTTP status of every response, and optionally waits for the
//! matching delivery event on a Pub/Sub subscription.
//!
//! ## Features
//!
//! - Suite definitions in YAML or JSON
//! - HMAC-SHA256 request signing
//! - Delivery correlation over Pub/Sub (or the emulator)
//! - Sequential or parallel execution with ordered results
//! - HTML and JUnit reports, Qase result upload and case sync
//!
//! ## Usage
//!
//! ```bash
//! # Run the suite found in ./config/testcases.yaml
//! webhook-tester run
//!
//! # Run a specific suite in parallel
//! webhook-tester run --config suite.yaml --parallel --concurrent 8
//!
//! # Create or update Qase cases
//! webhook-tester sync
//!
//! # List the suite's cases
//! webhook-tester list --config suite.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod cli;
mod config;
mod executor;
mod http;
mod models;
mod output;
mod pubsub;
mod qase;
mod results;
mod utils;

use cli::Args;
use config::{EnvConfig, QaseCredentials};
use executor::{ParallelExecutor, SuiteRunner};
use http::HttpClient;
use models::{RunSummary, TestSuite};
use output::ResultFormatter;
use pubsub::{Correlator, RestSubscription};
use qase::QaseClient;
use utils::init_logger;

/// Upper bound for a single Pub/Sub pull
const PULL_TIMEOUT: Duration = Duration::from_secs(10);

const HTML_REPORT: &str = "report.html";
const JUNIT_REPORT: &str = "test-results.xml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.with_verbose(args.verbose));

    let env = EnvConfig::load();

    match args.command {
        cli::Command::Run(run_args) => {
            let fail_on_error = run_args.fail_on_error;
            let summary = run_suite(run_args, &env).await?;
            if fail_on_error && !summary.is_all_passed() {
                anyhow::bail!("{} of {} test cases failed", summary.failed, summary.total);
            }
        }
        cli::Command::Sync(suite_args) => {
            sync_cases(suite_args, &env).await?;
        }
        cli::Command::List(suite_args) => {
            list_cases(suite_args)?;
        }
    }

    Ok(())
}

fn load(args: &cli::SuiteArgs) -> Result<TestSuite> {
    let path: PathBuf = match &args.config {
        Some(path) => path.clone(),
        None => config::find_suite().ok_or(config::ConfigError::NotFound)?,
    };
    info!("Loading test suite from {}", path.display());
    let suite = config::load_suite(&path)?;
    Ok(suite)
}

async fn run_suite(args: cli::RunArgs, env: &EnvConfig) -> Result<RunSummary> {
    let mut suite = load(&args.suite)?;
    if let Some(timeout) = args.timeout {
        suite.timeout_secs = timeout;
    }

    info!(
        "Running {} test cases against {} ({} awaiting delivery)",
        suite.test_cases.len(),
        suite.base_url,
        suite.delivery_cases()
    );

    let client = HttpClient::builder()
        .timeout(Duration::from_secs(suite.timeout_secs))
        .accept_invalid_certs(args.insecure)
        .build()
        .context("Failed to create HTTP client")?;
    let mut runner = SuiteRunner::for_suite(&suite, client);

    match (&suite.pubsub, args.skip_delivery) {
        (Some(pubsub), false) => {
            let pull_client = HttpClient::with_timeout(PULL_TIMEOUT)
                .context("Failed to create Pub/Sub client")?;
            let mut subscription =
                RestSubscription::new(pull_client, &pubsub.project_id, &pubsub.subscription_id);
            if let Some(endpoint) = env.pubsub_endpoint() {
                info!("Using Pub/Sub emulator at {}", endpoint);
                subscription = subscription.with_endpoint(endpoint);
            }
            if let Some(token) = &env.pubsub_access_token {
                subscription = subscription.with_access_token(token);
            }
            runner = runner.with_correlator(
                Correlator::new(Arc::new(subscription)),
                Duration::from_secs(pubsub.timeout_secs),
            );
        }
        (Some(_), true) => info!("Delivery checks skipped"),
        (None, _) => {}
    }

    let summary = if args.parallel {
        ParallelExecutor::new(runner, args.concurrent)
            .run_summary(Arc::new(suite))
            .await
    } else {
        runner.run_summary(&suite).await
    };

    let formatter = ResultFormatter::new(args.format);
    println!("{}", formatter.format_summary(&summary));

    if !args.no_reports {
        write_reports(&summary, &args.output_dir);
    }

    report_to_qase(&summary, env).await;

    Ok(summary)
}

fn write_reports(summary: &RunSummary, output_dir: &std::path::Path) {
    let html = output_dir.join(HTML_REPORT);
    match results::write_html_report(summary, &html) {
        Ok(()) => info!("HTML report written to {}", html.display()),
        Err(e) => warn!("Failed to write HTML report: {:#}", e),
    }

    let junit = output_dir.join(JUNIT_REPORT);
    match results::write_junit_report(summary, &junit) {
        Ok(()) => info!("JUnit report written to {}", junit.display()),
        Err(e) => warn!("Failed to write JUnit report: {:#}", e),
    }
}

async fn report_to_qase(summary: &RunSummary, env: &EnvConfig) {
    let Some(run_id) = &env.qase_run_id else {
        info!("Skipping QASE reporting - no run ID specified");
        return;
    };
    let Some(QaseCredentials {
        api_token,
        project_code,
    }) = env.qase_credentials()
    else {
        warn!("Skipping QASE reporting - QASE_API_TOKEN or QASE_PROJECT_CODE not set");
        return;
    };

    let entries = summary.report_entries();
    let client = match QaseClient::new(api_token, project_code) {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to create QASE client: {}", e);
            return;
        }
    };

    match client.send_results(run_id, &entries).await {
        Ok(()) => info!("Reported {} results to QASE run {}", entries.len(), run_id),
        Err(e) => warn!("Failed to report results to QASE: {}", e),
    }
}

async fn sync_cases(args: cli::SuiteArgs, env: &EnvConfig) -> Result<()> {
    let suite = load(&args)?;
    let credentials = env
        .qase_credentials()
        .context("QASE_API_TOKEN and QASE_PROJECT_CODE must be set to sync test cases")?;

    let client = QaseClient::new(credentials.api_token, credentials.project_code)?;
    let report = client.sync_test_cases(&suite.test_cases).await?;

    println!(
        "✓ Synced {} test cases ({} created, {} updated)",
        suite.test_cases.len(),
        report.created,
        report.updated
    );
    Ok(())
}

fn list_cases(args: cli::SuiteArgs) -> Result<()> {
    let suite = load(&args)?;

    println!("\nWebhook Test Cases ({} total)\n", suite.test_cases.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (index, case) in suite.test_cases.iter().enumerate() {
        let delivery = if case.await_delivery {
            format!("awaits {:?}", case.match_token())
        } else {
            "no delivery check".to_string()
        };
        let case_id = suite
            .case_ids
            .get(&case.name)
            .map(|id| format!("Qase #{id}"))
            .unwrap_or_else(|| "unlinked".to_string());

        println!(
            "  {:2}. {:32} HTTP {} [{}] [{}]",
            index + 1,
            case.name,
            case.expected_status,
            delivery,
            case_id
        );
        println!("      payload: {}", case.payload_file.display());
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}
