//! Outbound completion webhook.
//!
//! Delivery is best-effort: one POST, no retry. The job's terminal status is
//! persisted before any attempt, so a failed delivery never changes it.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use feedrun_core::{JobType, Outcome};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `result` object of the callback envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destination_s3_path: String,
}

/// Webhook envelope, identical in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub job_id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: Outcome,
    #[serde(default)]
    pub result: CallbackResult,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub err: String,
}

impl CallbackPayload {
    pub fn new(
        job_id: impl Into<String>,
        job_type: JobType,
        status: Outcome,
        destination: Option<&str>,
        err: Option<&str>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            job_type,
            status,
            result: CallbackResult {
                destination_s3_path: destination.unwrap_or_default().to_string(),
            },
            err: err.unwrap_or_default().to_string(),
        }
    }

    pub fn destination(&self) -> Option<&str> {
        Some(self.result.destination_s3_path.as_str()).filter(|s| !s.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        Some(self.err.as_str()).filter(|s| !s.is_empty())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "job_id must be a string or number, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Webhook delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("callback returned HTTP {0}")]
    HttpStatus(u16),
}

/// Posts [`CallbackPayload`]s to caller-supplied URLs.
#[derive(Debug, Clone)]
pub struct CallbackNotifier {
    client: reqwest::Client,
}

impl Default for CallbackNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CallbackNotifier {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to configure callback client, using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    /// Single POST; non-2xx is an error.
    pub async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<(), CallbackError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(CallbackError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    /// [`notify`](Self::notify), logging instead of returning failures.
    ///
    /// Returns whether the webhook accepted the payload. Without a URL the
    /// callback is skipped.
    pub async fn notify_best_effort(&self, url: Option<&str>, payload: &CallbackPayload) -> bool {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            tracing::warn!(job_id = %payload.job_id, "no callback URL configured; skipping callback");
            return false;
        };

        match self.notify(url, payload).await {
            Ok(()) => {
                tracing::info!(job_id = %payload.job_id, url, status = %payload.status, "callback sent");
                true
            }
            Err(e) => {
                tracing::error!(job_id = %payload.job_id, url, error = %e, "failed to send callback");
                false
            }
        }
    }
}
