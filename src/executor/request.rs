//! Signed request execution
//!
//! Sends one signed POST per test case and classifies the response.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::http::{self, HttpClient, HttpError, HttpRequest};
use crate::models::{Credentials, ExecutionOutcome, TestCase, DEFAULT_SIGNATURE_HEADER};

/// Executes single test cases against a webhook endpoint
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    client: HttpClient,
    signature_header: String,
}

impl RequestExecutor {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
        }
    }

    /// Create an executor whose requests are bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        Ok(Self::new(HttpClient::with_timeout(timeout)?))
    }

    pub fn signature_header(mut self, header: impl Into<String>) -> Self {
        self.signature_header = header.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.client.timeout()
    }

    /// Run one test case. Never fails; every problem is recorded in the outcome.
    pub async fn execute(
        &self,
        endpoint: &str,
        test_case: &TestCase,
        credentials: &Credentials,
    ) -> ExecutionOutcome {
        let name = test_case.name.as_str();

        if endpoint.is_empty() || test_case.payload_file.as_os_str().is_empty() {
            return ExecutionOutcome::fail(
                name,
                "Invalid test configuration",
                "Missing required parameters",
            );
        }

        let payload = match read_payload(&test_case.payload_file).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "Cannot read payload {} for {}: {}",
                    test_case.payload_file.display(),
                    name,
                    e
                );
                return ExecutionOutcome::fail(name, "Failed to read payload file", e.to_string());
            }
        };

        let signature = http::sign(credentials.secret.as_bytes(), &payload);
        debug!("Signed {} byte payload for {}", payload.len(), name);

        let request = HttpRequest::post(endpoint)
            .query("tenant_id", &credentials.tenant_id)
            .query("channel_id", &credentials.channel_id)
            .header("Content-Type", "application/json")
            .header(&self.signature_header, signature)
            .body(payload);

        let response = match self.client.send(request).await {
            Ok(response) => response,
            Err(HttpError::Timeout(after)) => {
                return ExecutionOutcome::fail(
                    name,
                    "HTTP request timed out",
                    format!("no response within {}ms", after.as_millis()),
                );
            }
            Err(e @ HttpError::Body(_)) => {
                return ExecutionOutcome::fail(name, "Failed to read response body", e.to_string());
            }
            Err(e) => {
                return ExecutionOutcome::fail(name, "HTTP request failed", e.to_string());
            }
        };

        if response.status_code == test_case.expected_status {
            ExecutionOutcome::pass(name, response.status_code, response.body)
        } else {
            ExecutionOutcome::status_mismatch(
                name,
                test_case.expected_status,
                response.status_code,
                response.body,
            )
        }
    }
}

async fn read_payload(path: &Path) -> std::io::Result<Vec<u8>> {
    tokio::fs::read(path).await
}
