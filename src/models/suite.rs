//! Suite definition models
//!
//! Defines the test suite, its cases, and the optional Pub/Sub section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Default header carrying the payload signature
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Line-Signature";

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// A complete webhook test suite
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestSuite {
    /// Webhook endpoint under test
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub channel_id: String,

    /// Shared secret used to sign every payload
    #[serde(default, rename = "channel_secret")]
    pub secret: String,

    /// Header the signature is sent in
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delivery confirmation source
    #[serde(default)]
    pub pubsub: Option<PubSubConfig>,

    /// Test-management case ids keyed by test case name
    #[serde(default)]
    pub case_ids: HashMap<String, u64>,

    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Credentials shared by every case in the suite
    pub fn credentials(&self) -> Credentials {
        Credentials {
            tenant_id: self.tenant_id.clone(),
            channel_id: self.channel_id.clone(),
            secret: self.secret.clone(),
        }
    }

    /// Number of cases waiting on a delivery event
    pub fn delivery_cases(&self) -> usize {
        self.test_cases.iter().filter(|c| c.await_delivery).count()
    }
}

/// One named payload plus its expected status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    #[serde(default)]
    pub payload_file: PathBuf,

    pub expected_status: u16,

    /// Wait for a matching Pub/Sub message after the HTTP call
    #[serde(default)]
    pub await_delivery: bool,

    /// Substring to look for in delivered messages; defaults to the name
    #[serde(default)]
    pub delivery_token: Option<String>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        payload_file: impl Into<PathBuf>,
        expected_status: u16,
    ) -> Self {
        Self {
            name: name.into(),
            payload_file: payload_file.into(),
            expected_status,
            await_delivery: false,
            delivery_token: None,
        }
    }

    pub fn with_delivery(mut self) -> Self {
        self.await_delivery = true;
        self
    }

    pub fn with_delivery_token(mut self, token: impl Into<String>) -> Self {
        self.await_delivery = true;
        self.delivery_token = Some(token.into());
        self
    }

    /// Token used to correlate delivery events with this case
    pub fn match_token(&self) -> &str {
        self.delivery_token.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (expect {})", self.name, self.expected_status)
    }
}

/// Pub/Sub subscription carrying delivery confirmations
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSubConfig {
    pub project_id: String,
    pub subscription_id: String,

    /// Correlation window per case in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Identifiers and secret attached to every request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub tenant_id: String,
    pub channel_id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(
        tenant_id: impl Into<String>,
        channel_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            channel_id: channel_id.into(),
            secret: secret.into(),
        }
    }
}
