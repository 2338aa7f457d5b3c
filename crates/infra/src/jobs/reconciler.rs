//! Inbound completion callbacks.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use feedrun_core::{DomainError, JobId, JobStatus};

use super::error::EngineError;
use super::ids::IdTranslator;
use super::notifier::CallbackPayload;
use super::outcome::{Conclusion, conclude};
use super::store::{JobStore, JobStoreError};
use super::types::{ActivitySource, FailureSource, NewActivity};

/// Envelope fields an inbound callback must carry.
const REQUIRED_FIELDS: [&str; 3] = ["job_id", "type", "status"];

/// Acknowledgement returned to the callback sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackAck {
    pub received: bool,
    pub job_id: String,
    pub status: JobStatus,
}

/// Applies inbound completion notices to the job store.
///
/// May race with the dispatcher's own conclusion; both go through
/// [`conclude`], so either order converges.
pub struct CallbackReconciler {
    store: Arc<dyn JobStore>,
    ids: Arc<IdTranslator>,
}

impl CallbackReconciler {
    pub fn new(store: Arc<dyn JobStore>, ids: Arc<IdTranslator>) -> Self {
        Self { store, ids }
    }

    pub fn receive(&self, raw: &Value, requested_by: &str) -> Result<CallbackAck, EngineError> {
        let payload = parse(raw)?;

        let internal = self.ids.to_internal(&payload.job_id);
        let job_id: JobId = internal
            .parse()
            .map_err(|_| DomainError::not_found(payload.job_id.clone()))?;
        if self.store.get(job_id)?.is_none() {
            warn!(job_id = %payload.job_id, "callback for unknown job");
            return Err(DomainError::not_found(payload.job_id).into());
        }

        let conclusion = Conclusion {
            job_type: payload.job_type,
            outcome: payload.status,
            destination: payload.destination().map(str::to_string),
            error: payload.error().map(str::to_string),
        };
        let job = self.store.update_with(job_id, &mut |job| {
            conclude(job, &conclusion, FailureSource::Callback).map_err(JobStoreError::from)
        })?;
        // Only applied callbacks enter the audit trail.
        self.store.record_activity(NewActivity::for_job(
            job_id,
            ActivitySource::Callback,
            requested_by,
            raw.clone(),
        ))?;

        info!(job_id = %job.id, status = %job.status, "callback applied");
        Ok(CallbackAck {
            received: true,
            job_id: payload.job_id,
            status: job.status,
        })
    }
}

fn parse(raw: &Value) -> Result<CallbackPayload, DomainError> {
    let Some(object) = raw.as_object() else {
        return Err(DomainError::validation("callback body must be a JSON object"));
    };
    let missing: Vec<&str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|k| match object.get(*k) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::validation(format!("Missing fields: {missing:?}")));
    }
    serde_json::from_value(raw.clone())
        .map_err(|e| DomainError::validation(format!("malformed callback: {e}")))
}
