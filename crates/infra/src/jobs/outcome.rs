//! The status-setting operation shared by the dispatcher and the reconciler.
//!
//! Both completion paths may race on the same job. They converge here, and
//! applying the same conclusion twice yields the same `status` and failure
//! list.

use chrono::Utc;
use serde_json::Value;

use feedrun_core::{DomainError, JobType, Outcome};

use super::types::{FailureRecord, FailureSource, Job, JobPatch, keys};

/// Error text recorded when a failure carries no message.
const UNKNOWN_ERROR: &str = "unknown error";

/// Result of one run, from whichever path observed it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    pub job_type: JobType,
    pub outcome: Outcome,
    pub destination: Option<String>,
    pub error: Option<String>,
}

impl Conclusion {
    pub fn success(job_type: JobType, destination: Option<String>) -> Self {
        Self {
            job_type,
            outcome: Outcome::Success,
            destination,
            error: None,
        }
    }

    pub fn failed(job_type: JobType, error: impl Into<String>) -> Self {
        Self {
            job_type,
            outcome: Outcome::Failed,
            destination: None,
            error: Some(error.into()),
        }
    }
}

/// Patch that moves `job` to the terminal status of `conclusion`.
///
/// Failures append a [`FailureRecord`] to `job_data.failure`, unless the job
/// already sits in its failure status with the same latest message. A
/// success stores the reported destination as `job_data.result_path`.
/// Successes and callback conclusions reset `retry_count` to 0; a
/// dispatcher failure keeps it so the retry budget still applies.
pub fn conclude(job: &Job, conclusion: &Conclusion, source: FailureSource) -> Result<JobPatch, DomainError> {
    let target = conclusion.job_type.status_for(conclusion.outcome);
    job.status.ensure_transition(target)?;

    let mut data = job.job_data.clone();
    match conclusion.outcome {
        Outcome::Success => {
            if let Some(destination) = conclusion.destination.as_deref().filter(|d| !d.is_empty()) {
                data.insert(keys::RESULT_PATH.to_string(), Value::from(destination));
            }
        }
        Outcome::Failed => {
            let error = conclusion
                .error
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(UNKNOWN_ERROR);
            let repeated = job.status == target
                && job.failures().last().is_some_and(|last| last.error == error);
            if !repeated {
                let record = FailureRecord {
                    error: error.to_string(),
                    source,
                    retry_count: job.retry_count,
                    recorded_at: Utc::now(),
                };
                let entry = serde_json::to_value(record)
                    .map_err(|e| DomainError::validation(format!("unencodable failure record: {e}")))?;
                match data.get_mut(keys::FAILURE).and_then(Value::as_array_mut) {
                    Some(list) => list.push(entry),
                    None => {
                        data.insert(keys::FAILURE.to_string(), Value::Array(vec![entry]));
                    }
                }
            }
        }
    }

    let mut patch = JobPatch::new().status(target).job_data(data);
    if conclusion.outcome == Outcome::Success || source == FailureSource::Callback {
        patch = patch.retry_count(0);
    }
    Ok(patch)
}
