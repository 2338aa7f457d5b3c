//! Job and activity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use feedrun_core::{ActivityId, JobId, JobStatus, JobType};

/// Open, type-specific job payload (paths, failure history, ...).
pub type JobData = Map<String, Value>;

/// Well-known `job_data` keys.
pub mod keys {
    pub const SOURCE_PATH: &str = "source_path";
    pub const DESTINATION_PATH: &str = "destination_path";
    pub const DISTINGUISH_ID: &str = "distinguish_id";
    pub const CALLBACK_URL: &str = "callback_url";
    pub const RESULT_PATH: &str = "result_path";
    pub const FAILURE: &str = "failure";
}

/// Entity type recorded on activities that reference a job.
pub const JOB_ENTITY: &str = "job";

/// One feed-processing request and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Caller-supplied identifier; display/translation only.
    #[serde(default)]
    pub external_id: Option<String>,
    pub merchant_id: String,
    pub partner_id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub retry_count: u32,
    #[serde(default)]
    pub job_data: JobData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in its type's initial status.
    pub fn new(
        merchant_id: impl Into<String>,
        partner_id: impl Into<String>,
        job_type: JobType,
        job_data: JobData,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            external_id: None,
            merchant_id: merchant_id.into(),
            partner_id: partner_id.into(),
            job_type,
            status: job_type.initial_status(),
            retry_count: 0,
            job_data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Merge a patch into this record (shallow, top-level fields only).
    ///
    /// `job_data` in a patch replaces the whole sub-object. `updated_at` is
    /// always refreshed.
    pub fn apply(&mut self, patch: JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(retry_count) = patch.retry_count {
            self.retry_count = retry_count;
        }
        if let Some(job_data) = patch.job_data {
            self.job_data = job_data;
        }
        if let Some(external_id) = patch.external_id {
            self.external_id = Some(external_id);
        }
        let now = Utc::now();
        // Keep updated_at strictly moving forward even on coarse clocks.
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.job_data.get(key).and_then(Value::as_str)
    }

    pub fn source_path(&self) -> Option<&str> {
        self.data_str(keys::SOURCE_PATH)
    }

    pub fn destination_path(&self) -> Option<&str> {
        self.data_str(keys::DESTINATION_PATH)
    }

    pub fn distinguish_id(&self) -> Option<&str> {
        self.data_str(keys::DISTINGUISH_ID)
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.data_str(keys::CALLBACK_URL)
    }

    /// Destination reported by the last successful run, if any.
    pub fn result_path(&self) -> Option<&str> {
        self.data_str(keys::RESULT_PATH)
    }

    /// Accumulated failure records; malformed entries are skipped.
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.job_data
            .get(keys::FAILURE)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Partial update applied by [`JobStore::update`](super::store::JobStore::update).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub retry_count: Option<u32>,
    pub job_data: Option<JobData>,
    pub external_id: Option<String>,
}

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn job_data(mut self, job_data: JobData) -> Self {
        self.job_data = Some(job_data);
        self
    }
}

/// Which path recorded a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSource {
    Dispatcher,
    Callback,
}

/// One entry of the `job_data.failure` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub error: String,
    pub source: FailureSource,
    pub retry_count: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Origin of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Ui,
    Callback,
}

/// Immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub entity_type: String,
    pub entity_id: JobId,
    pub source: ActivitySource,
    pub requested_by: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Activity fields supplied by the caller; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub entity_type: String,
    pub entity_id: JobId,
    pub source: ActivitySource,
    pub requested_by: String,
    pub payload: Value,
}

impl NewActivity {
    pub fn for_job(
        job_id: JobId,
        source: ActivitySource,
        requested_by: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            entity_type: JOB_ENTITY.to_string(),
            entity_id: job_id,
            source,
            requested_by: requested_by.into(),
            payload,
        }
    }

    pub(crate) fn into_activity(self, created_at: DateTime<Utc>) -> Activity {
        Activity {
            id: ActivityId::new(),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            source: self.source,
            requested_by: self.requested_by,
            payload: self.payload,
            created_at,
        }
    }
}
