//! Environment variable configuration
//!
//! Credentials and ids for the external services, read once by the CLI.

use std::env;

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// QASE_RUN_ID
    pub qase_run_id: Option<String>,
    /// QASE_API_TOKEN
    pub qase_api_token: Option<String>,
    /// QASE_PROJECT_CODE
    pub qase_project_code: Option<String>,
    /// PUBSUB_ACCESS_TOKEN
    pub pubsub_access_token: Option<String>,
    /// PUBSUB_EMULATOR_HOST
    pub pubsub_emulator_host: Option<String>,
}

/// Qase credentials, present only when both token and project are set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaseCredentials {
    pub api_token: String,
    pub project_code: String,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            qase_run_id: get("QASE_RUN_ID"),
            qase_api_token: get("QASE_API_TOKEN"),
            qase_project_code: get("QASE_PROJECT_CODE"),
            pubsub_access_token: get("PUBSUB_ACCESS_TOKEN"),
            pubsub_emulator_host: get("PUBSUB_EMULATOR_HOST"),
        }
    }

    pub fn qase_credentials(&self) -> Option<QaseCredentials> {
        Some(QaseCredentials {
            api_token: self.qase_api_token.clone()?,
            project_code: self.qase_project_code.clone()?,
        })
    }

    /// Base URL of the Pub/Sub emulator, if one is configured
    pub fn pubsub_endpoint(&self) -> Option<String> {
        self.pubsub_emulator_host.as_ref().map(|host| {
            if host.starts_with("http://") || host.starts_with("https://") {
                host.clone()
            } else {
                format!("http://{host}")
            }
        })
    }
}
