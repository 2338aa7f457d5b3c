use serde::{Deserialize, Serialize};

use feedrun_infra::jobs::{Activity, Job};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RetryRequest {
    pub requested_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub merchant_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// `result` object of [`JobEnvelope`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultBody {
    pub destination_s3_path: String,
}

/// Response envelope shared by submission, retry and status endpoints.
///
/// `status` is `success` when the request was handled, `failed` otherwise;
/// the job's own lifecycle status is `job_status`.
#[derive(Debug, Clone, Serialize)]
pub struct JobEnvelope {
    pub job_id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: &'static str,
    pub response_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    pub result: ResultBody,
    pub err: String,
}

impl JobEnvelope {
    pub fn for_job(job_ref: String, job: &Job, response_status: u16) -> Self {
        Self {
            job_id: job_ref,
            job_type: job.job_type.to_string(),
            status: "success",
            response_status,
            job_status: Some(job.status.to_string()),
            retry_count: Some(job.retry_count),
            result: ResultBody {
                destination_s3_path: job.result_path().unwrap_or_default().to_string(),
            },
            err: String::new(),
        }
    }

    pub fn failed(job_ref: impl Into<String>, job_type: impl Into<String>, response_status: u16, err: impl Into<String>) -> Self {
        Self {
            job_id: job_ref.into(),
            job_type: job_type.into(),
            status: "failed",
            response_status,
            job_status: None,
            retry_count: None,
            result: ResultBody::default(),
            err: err.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobList {
    pub count: usize,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct ActivityList {
    pub job_id: String,
    pub activities: Vec<Activity>,
}
