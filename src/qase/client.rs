//! Qase test-management API client
//!
//! Syncs suite cases into a Qase project and uploads run results in bulk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::models::{ReportEntry, TestCase};

/// Qase public API root
pub const QASE_API: &str = "https://api.qase.io/v1";

const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_SIZE: usize = 100;

/// Qase client errors
#[derive(Error, Debug)]
pub enum QaseError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Qase API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected Qase response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CasePage {
    #[serde(default)]
    entities: Vec<CaseEntity>,
}

#[derive(Deserialize)]
struct CaseEntity {
    id: u64,
    title: String,
}

#[derive(Deserialize)]
struct CreatedCase {
    id: u64,
}

/// Case definition sent to Qase
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QaseCase {
    pub title: String,
    pub automation: u8,
    pub steps: Vec<QaseStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub custom_fields: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QaseStep {
    pub action: String,
    #[serde(rename = "expected_result")]
    pub expected: String,
}

impl From<&TestCase> for QaseCase {
    fn from(case: &TestCase) -> Self {
        let subject = case.name.strip_prefix("TC-").unwrap_or(&case.name);
        let mut custom_fields = HashMap::new();
        custom_fields.insert(
            "payload_file".to_string(),
            case.payload_file.display().to_string(),
        );

        Self {
            title: case.name.clone(),
            automation: 1,
            steps: vec![QaseStep {
                action: format!("Send {subject} payload"),
                expected: format!("Should return HTTP {}", case.expected_status),
            }],
            tags: vec!["auto-sync".to_string(), "line-webhook".to_string()],
            custom_fields,
        }
    }
}

/// Counts from a sync pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
}

#[derive(Serialize)]
struct BulkResults<'a> {
    results: &'a [ReportEntry],
}

/// Client for one Qase project
pub struct QaseClient {
    client: HttpClient,
    base_url: String,
    api_token: String,
    project_code: String,
}

impl QaseClient {
    pub fn new(
        api_token: impl Into<String>,
        project_code: impl Into<String>,
    ) -> Result<Self, QaseError> {
        Ok(Self {
            client: HttpClient::with_timeout(CLIENT_TIMEOUT)?,
            base_url: QASE_API.to_string(),
            api_token: api_token.into(),
            project_code: project_code.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QaseError> {
        let response = self
            .client
            .send(request.header("Token", &self.api_token))
            .await?;
        if !response.is_success() {
            return Err(QaseError::Status {
                status: response.status_code,
                body: response.body,
            });
        }
        Ok(response)
    }

    fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, QaseError> {
        response
            .json::<Envelope<T>>()
            .map(|envelope| envelope.result)
            .map_err(|e| QaseError::Decode(e.to_string()))
    }

    /// Create or update a Qase case for every suite case, matched by title
    pub async fn sync_test_cases(&self, cases: &[TestCase]) -> Result<SyncReport, QaseError> {
        let existing = self.existing_cases().await?;
        debug!("Found {} existing Qase cases", existing.len());

        let mut report = SyncReport::default();
        for case in cases {
            let qase_case = QaseCase::from(case);
            match existing.get(&case.name) {
                Some(&case_id) => {
                    self.update_case(case_id, &qase_case).await?;
                    info!("Updated Qase case {}: {}", case_id, case.name);
                    report.updated += 1;
                }
                None => {
                    let case_id = self.create_case(&qase_case).await?;
                    info!("Created Qase case {}: {}", case_id, case.name);
                    report.created += 1;
                }
            }
        }
        Ok(report)
    }

    async fn existing_cases(&self) -> Result<HashMap<String, u64>, QaseError> {
        let mut cases = HashMap::new();
        let mut offset = 0;

        loop {
            let request = HttpRequest::get(format!("{}/case/{}", self.base_url, self.project_code))
                .query("limit", PAGE_SIZE.to_string())
                .query("offset", offset.to_string());
            let page: CasePage = Self::decode(&self.send(request).await?)?;
            let fetched = page.entities.len();

            cases.extend(page.entities.into_iter().map(|e| (e.title, e.id)));

            if fetched < PAGE_SIZE {
                return Ok(cases);
            }
            offset += fetched;
        }
    }

    async fn create_case(&self, case: &QaseCase) -> Result<u64, QaseError> {
        #[derive(Serialize)]
        struct NewCase<'a> {
            title: &'a str,
            automation: u8,
            steps: &'a [QaseStep],
        }

        let body = NewCase {
            title: &case.title,
            automation: case.automation,
            steps: &case.steps,
        };
        let request =
            HttpRequest::post(format!("{}/case/{}", self.base_url, self.project_code)).json(&body)?;
        let created: CreatedCase = Self::decode(&self.send(request).await?)?;
        Ok(created.id)
    }

    async fn update_case(&self, case_id: u64, case: &QaseCase) -> Result<(), QaseError> {
        let request = HttpRequest::patch(format!(
            "{}/case/{}/{}",
            self.base_url, self.project_code, case_id
        ))
        .json(case)?;
        self.send(request).await?;
        Ok(())
    }

    /// Upload results for an existing run
    pub async fn send_results(&self, run_id: &str, results: &[ReportEntry]) -> Result<(), QaseError> {
        if results.is_empty() {
            info!("No Qase results to report for run {}", run_id);
            return Ok(());
        }

        let request = HttpRequest::post(format!(
            "{}/result/{}/{}/bulk",
            self.base_url, self.project_code, run_id
        ))
        .header("X-Qase-Run", run_id)
        .json(&BulkResults { results })?;
        self.send(request).await?;

        info!(
            "Successfully reported {} results to Qase run {}",
            results.len(),
            run_id
        );
        Ok(())
    }
}
