//! Suite file loading
//!
//! Handles finding, loading, and validating suite definitions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::TestSuite;

/// Suite file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./config/testcases.yaml",
    "./config/testcases.yml",
    "./testcases.yaml",
    "./webhook-tester.yaml",
];

/// Errors that abort a run before any case executes
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML unmarshal error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON unmarshal error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required configuration fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("test case #{0} has no name")]
    UnnamedCase(usize),

    #[error("duplicate test case name: {0}")]
    DuplicateCase(String),

    #[error("pubsub section requires project_id and subscription_id")]
    IncompletePubSub,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("no suite file found (looked in {})", CONFIG_LOCATIONS.join(", "))]
    NotFound,
}

/// Find a suite file in the standard locations
pub fn find_suite() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load and validate a suite definition
pub fn load_suite(path: impl AsRef<Path>) -> Result<TestSuite, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let suite: TestSuite = if is_json_file(path) {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    validate(&suite)?;
    debug!(
        "Loaded {} test cases from {}",
        suite.test_cases.len(),
        path.display()
    );
    Ok(suite)
}

/// Check the fields every run needs
pub fn validate(suite: &TestSuite) -> Result<(), ConfigError> {
    let missing: Vec<&'static str> = [
        ("base_url", suite.base_url.as_str()),
        ("tenant_id", suite.tenant_id.as_str()),
        ("channel_id", suite.channel_id.as_str()),
        ("channel_secret", suite.secret.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if !missing.is_empty() {
        return Err(ConfigError::MissingFields(missing));
    }

    if suite.timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout("timeout_secs"));
    }

    let mut seen = HashSet::new();
    for (index, case) in suite.test_cases.iter().enumerate() {
        if case.name.trim().is_empty() {
            return Err(ConfigError::UnnamedCase(index + 1));
        }
        if !seen.insert(case.name.as_str()) {
            return Err(ConfigError::DuplicateCase(case.name.clone()));
        }
    }

    if let Some(pubsub) = &suite.pubsub {
        if pubsub.project_id.is_empty() || pubsub.subscription_id.is_empty() {
            return Err(ConfigError::IncompletePubSub);
        }
        if pubsub.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("pubsub.timeout_secs"));
        }
    }

    Ok(())
}

fn is_json_file(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const SUITE: &str = r#"
base_url: https://hooks.example.com/line
tenant_id: tenant-1
channel_id: "200"
channel_secret: abc
case_ids:
  TC-001 Text Event: 101
test_cases:
  - name: TC-001 Text Event
    payload_file: payloads/text.json
    expected_status: 200
  - name: TC-002 Follow Event
    payload_file: payloads/follow.json
    expected_status: 200
    await_delivery: true
"#;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn test_load_yaml_suite() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "testcases.yaml", SUITE);

        let suite = load_suite(&path).unwrap();
        assert_eq!(suite.channel_id, "200");
        assert_eq!(suite.test_cases.len(), 2);
        assert!(suite.test_cases[1].await_delivery);
        assert_eq!(suite.case_ids.get("TC-001 Text Event"), Some(&101));
    }

    #[test]
    fn test_load_json_suite() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "suite.json",
            r#"{"base_url":"http://x","tenant_id":"t","channel_id":"c","channel_secret":"s",
               "test_cases":[{"name":"a","payload_file":"a.json","expected_status":202}]}"#,
        );

        let suite = load_suite(&path).unwrap();
        assert_eq!(suite.test_cases[0].expected_status, 202);
    }

    #[test]
    fn test_missing_fields_are_fatal() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "testcases.yaml",
            "base_url: http://x\ntenant_id: t\ntest_cases: []\n",
        );

        let err = load_suite(&path).unwrap_err();
        match err {
            ConfigError::MissingFields(fields) => {
                assert_eq!(fields, vec!["channel_id", "channel_secret"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_case_names() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "testcases.yaml",
            r#"
base_url: http://x
tenant_id: t
channel_id: c
channel_secret: s
test_cases:
  - { name: dup, payload_file: a.json, expected_status: 200 }
  - { name: dup, payload_file: b.json, expected_status: 200 }
"#,
        );

        assert!(matches!(
            load_suite(&path),
            Err(ConfigError::DuplicateCase(name)) if name == "dup"
        ));
    }

    #[test]
    fn test_unreadable_file() {
        let err = load_suite("/no/such/testcases.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_yaml() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "testcases.yaml", "test_cases: [unterminated");
        assert!(matches!(load_suite(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let dir = tempdir().unwrap();
        let base = "base_url: http://x\ntenant_id: t\nchannel_id: c\nchannel_secret: s\n";

        let path = write(&dir, "request.yaml", &format!("{base}timeout_secs: 0\n"));
        assert!(matches!(
            load_suite(&path),
            Err(ConfigError::ZeroTimeout("timeout_secs"))
        ));

        let path = write(
            &dir,
            "delivery.yaml",
            &format!("{base}pubsub:\n  project_id: p\n  subscription_id: s\n  timeout_secs: 0\n"),
        );
        assert!(matches!(
            load_suite(&path),
            Err(ConfigError::ZeroTimeout("pubsub.timeout_secs"))
        ));
    }

    #[test]
    fn test_incomplete_pubsub() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "testcases.yaml",
            "base_url: http://x\ntenant_id: t\nchannel_id: c\nchannel_secret: s\npubsub:\n  project_id: p\n  subscription_id: ''\n",
        );
        assert!(matches!(
            load_suite(&path),
            Err(ConfigError::IncompletePubSub)
        ));
    }
}
