//! Classification service client.
//!
//! The classifier is an untrusted, best-effort collaborator: every failure
//! mode (unreachable, non-2xx, non-JSON, unexpected shape) degrades to a
//! context without a classification instead of failing the pipeline.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::types::Classification;

/// Cap on raw response bytes kept in the context document for triage.
const RAW_RESPONSE_LIMIT: usize = 4_000;

/// Request body sent to the classification service.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest {
    pub playwright_log: String,
    pub backend_log: String,
    pub run_id: String,
    pub run_attempt: u32,
    pub job_name: String,
    pub timestamp: String,
    pub branch: String,
    pub commit: String,
    pub status: String,
}

/// Result of one classification attempt.
///
/// `absent`, `malformed`, and `well-formed` are distinct cases and every
/// consumer must handle all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyOutcome {
    /// The service answered with a usable classification.
    Classified {
        classification: Classification,
        raw: Value,
    },
    /// The service answered, but not with a classification.
    Malformed { raw: String, error: String },
    /// The service could not be reached or refused the request.
    Unavailable { error: String },
}

/// Abstraction over the classification backend.
pub trait Classifier {
    fn classify(&self, request: &ClassifyRequest) -> ClassifyOutcome;
}

/// HTTP classifier with bearer auth and a hard request timeout.
pub struct CloudClassifier {
    url: String,
    token: String,
    client: Client,
}

impl CloudClassifier {
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build classification http client")?;
        Ok(Self { url, token, client })
    }
}

impl Classifier for CloudClassifier {
    fn classify(&self, request: &ClassifyRequest) -> ClassifyOutcome {
        debug!(url = %self.url, run_id = %request.run_id, "calling classification service");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(request)
            .send();

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(err = %err, "classification request failed");
                return ClassifyOutcome::Unavailable {
                    error: format!("request failed: {err}"),
                };
            }
        };

        let status = response.status();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                return ClassifyOutcome::Unavailable {
                    error: format!("failed to read response body: {err}"),
                };
            }
        };

        if !status.is_success() {
            warn!(status = %status, "classification service returned an error");
            return ClassifyOutcome::Unavailable {
                error: format!("service returned {}: {}", status, truncate(&body)),
            };
        }

        parse_classification(&body)
    }
}

/// Parse a service response body into a classification outcome.
///
/// Split out from the HTTP path so response handling is testable offline.
pub fn parse_classification(body: &str) -> ClassifyOutcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            return ClassifyOutcome::Malformed {
                raw: truncate(body),
                error: format!("non-JSON response: {err}"),
            };
        }
    };
    match serde_json::from_value::<Classification>(value.clone()) {
        Ok(classification) => ClassifyOutcome::Classified {
            classification,
            raw: value,
        },
        Err(err) => ClassifyOutcome::Malformed {
            raw: truncate(body),
            error: format!("unexpected response shape: {err}"),
        },
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= RAW_RESPONSE_LIMIT {
        return body.to_string();
    }
    let cut = body
        .char_indices()
        .take_while(|(i, _)| *i < RAW_RESPONSE_LIMIT)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    format!("{}… (truncated)", &body[..cut])
}
