//! Data types for the Brain submission endpoints.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::BrainError;

/// Basic-auth credentials, stored on disk as a two-element JSON array
/// `["username", "password"]`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, BrainError> {
        let raw = fs::read_to_string(path).map_err(|err| BrainError::Credentials {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let [username, password]: [String; 2] =
            serde_json::from_str(&raw).map_err(|err| BrainError::Credentials {
                path: path.to_path_buf(),
                reason: format!("expected a JSON array [username, password]: {err}"),
            })?;
        Ok(Self { username, password })
    }
}

/// Raw result of `POST /alphas/{id}/submit`.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub status: u16,
}

/// Raw result of `GET /alphas/{id}/submit`.
#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: u16,
    /// Server-directed wait in seconds, from the `Retry-After` header.
    /// Zero when the header is absent — the submission is resolved.
    pub retry_after: f64,
    pub body: String,
}

/// Body returned when a submission resolves unfavorably: the post-review
/// verdict with its per-check values under `is.checks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollVerdict {
    #[serde(default)]
    pub is: ChecksBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecksBlock {
    #[serde(default)]
    pub checks: Vec<CheckValue>,
}

/// One named check with whatever value the platform measured for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckValue {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn credentials_from_json_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("creds.json");
        fs::write(&path, r#"["trader42", "hunter2"]"#).unwrap();

        let creds = Credentials::from_file(&path).unwrap();
        assert_eq!(creds.username, "trader42");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn missing_credentials_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = Credentials::from_file(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(BrainError::Credentials { .. })));
    }

    #[test]
    fn malformed_credentials_are_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("creds.json");
        for bad in [r#"{"user": "x"}"#, r#"["only-one"]"#, "not json"] {
            fs::write(&path, bad).unwrap();
            assert!(matches!(
                Credentials::from_file(&path),
                Err(BrainError::Credentials { .. })
            ));
        }
    }

    #[test]
    fn poll_verdict_deserializes_from_api_format() {
        let body = r#"{
            "is": {
                "checks": [
                    {"name": "LOW_SHARPE", "value": 1.02},
                    {"name": "SELF_CORRELATION", "value": 0.81},
                    {"name": "UNITS"}
                ]
            }
        }"#;
        let verdict: PollVerdict = serde_json::from_str(body).unwrap();
        assert_eq!(verdict.is.checks.len(), 3);
        assert_eq!(verdict.is.checks[0].name, "LOW_SHARPE");
        assert_eq!(verdict.is.checks[0].value, serde_json::json!(1.02));
        assert_eq!(verdict.is.checks[2].value, serde_json::Value::Null);
    }

    #[test]
    fn poll_verdict_tolerates_missing_blocks() {
        let verdict: PollVerdict = serde_json::from_str("{}").unwrap();
        assert!(verdict.is.checks.is_empty());
    }
}
