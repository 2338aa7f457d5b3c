//! Front door of the engine: submission, retry and queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use feedrun_core::{DomainError, JobId, JobType};

use super::dispatcher::Dispatcher;
use super::error::EngineError;
use super::ids::IdTranslator;
use super::retry::RetryPolicy;
use super::store::JobStore;
use super::types::{Activity, ActivitySource, Job, JobData, JobPatch, NewActivity, keys};

const DEFAULT_REQUESTER: &str = "ui";

/// How caller-supplied job ids relate to stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdMode {
    /// External ids are registered with the translator and echoed back.
    Translated,
    /// Only internal ids are used; a caller-supplied id is ignored.
    Internal,
}

impl std::str::FromStr for IdMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "translated" => Ok(IdMode::Translated),
            "internal" => Ok(IdMode::Internal),
            other => Err(format!("unknown id mode '{other}'")),
        }
    }
}

/// Inbound request to validate (or generate) a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub destination_path: String,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub distinguish_id: Option<String>,
    #[serde(default, rename = "type")]
    pub job_type: Option<JobType>,
}

impl ValidationRequest {
    fn validate(&self, strict_paths: bool) -> Result<(), DomainError> {
        let missing: Vec<&str> = [
            ("source_path", self.source_path.as_str()),
            ("destination_path", self.destination_path.as_str()),
            ("merchant_id", self.merchant_id.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::validation(format!("Missing fields: {missing:?}")));
        }

        if strict_paths {
            for (field, path) in [
                ("source_path", &self.source_path),
                ("destination_path", &self.destination_path),
            ] {
                if !path.starts_with("s3://") {
                    return Err(DomainError::validation(format!(
                        "{field} must be an s3:// path, got '{path}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// `job_data` fields this request sets.
    fn job_data(&self) -> JobData {
        let mut data = JobData::new();
        data.insert(keys::SOURCE_PATH.into(), Value::from(self.source_path.as_str()));
        data.insert(keys::DESTINATION_PATH.into(), Value::from(self.destination_path.as_str()));
        if let Some(url) = self.callback_url.as_deref().filter(|u| !u.is_empty()) {
            data.insert(keys::CALLBACK_URL.into(), Value::from(url));
        }
        if let Some(token) = self.distinguish_id.as_deref().filter(|t| !t.is_empty()) {
            data.insert(keys::DISTINGUISH_ID.into(), Value::from(token));
        }
        data
    }

    fn requester(&self) -> &str {
        self.requested_by
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REQUESTER)
    }
}

/// Engine-wide service settings.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub retry: RetryPolicy,
    pub id_mode: IdMode,
    /// Require `s3://` source and destination paths.
    pub strict_paths: bool,
    /// Webhook used when neither the request nor the job names one.
    pub default_callback_url: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            id_mode: IdMode::Translated,
            strict_paths: true,
            default_callback_url: None,
        }
    }
}

/// An accepted submission or retry.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub job: Job,
    /// Id to echo back to the caller.
    pub job_ref: String,
    pub retried: bool,
}

/// Submission, retry and query operations over the engine.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    ids: Arc<IdTranslator>,
    dispatcher: Dispatcher,
    settings: ServiceSettings,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        ids: Arc<IdTranslator>,
        dispatcher: Dispatcher,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            ids,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Create a job and dispatch it, or retry the job already registered
    /// under the request's external id.
    pub fn submit(&self, request: ValidationRequest) -> Result<Accepted, EngineError> {
        request.validate(self.settings.strict_paths)?;

        let external_id = match self.settings.id_mode {
            IdMode::Translated => request.job_id.clone().filter(|id| !id.trim().is_empty()),
            IdMode::Internal => None,
        };

        if let Some(external) = external_id.as_deref().filter(|e| self.ids.is_registered(e)) {
            let job_id = self.resolve(external)?;
            info!(job_id = %job_id, external_id = external, "request matches an existing job; retrying");
            return self.retry_job(job_id, request.job_data(), request.requester(), json!(request));
        }

        let job_type = request.job_type.unwrap_or(JobType::FeedValidation);
        let partner_id = request
            .partner_id
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| request.merchant_id.clone());
        let mut job = Job::new(request.merchant_id.as_str(), partner_id, job_type, request.job_data());
        if let Some(external) = &external_id {
            job = job.with_external_id(external.as_str());
        }

        let job_id = self.store.insert(job.clone())?;
        if let Some(external) = &external_id {
            self.ids.register(external.as_str(), job_id);
        }
        self.store.record_activity(NewActivity::for_job(
            job_id,
            ActivitySource::Ui,
            request.requester(),
            json!(request),
        ))?;

        info!(job_id = %job_id, job_type = %job_type, "job created");
        self.dispatcher.dispatch(job_id, self.callback_url(&job));

        Ok(Accepted {
            job_ref: self.job_ref(&job),
            job,
            retried: false,
        })
    }

    /// Retry a failed job by external or internal id.
    pub fn retry(&self, job_ref: &str, requested_by: Option<&str>) -> Result<Accepted, EngineError> {
        let job_id = self.resolve(job_ref)?;
        let requester = requested_by.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_REQUESTER);
        self.retry_job(job_id, JobData::new(), requester, json!({"action": "retry"}))
    }

    /// `changes` are merged over the stored `job_data`; a retry may point the
    /// job at new paths.
    fn retry_job(
        &self,
        job_id: JobId,
        changes: JobData,
        requested_by: &str,
        payload: Value,
    ) -> Result<Accepted, EngineError> {
        let retry = &self.settings.retry;
        let job = self.store.update_with(job_id, &mut |job| {
            let next = retry.check_retry(job)?;
            let initial = job.job_type.initial_status();
            job.status.ensure_transition(initial)?;

            let mut data = job.job_data.clone();
            data.extend(changes.clone());
            Ok(JobPatch::new().status(initial).retry_count(next).job_data(data))
        })?;

        self.store.record_activity(NewActivity::for_job(
            job_id,
            ActivitySource::Ui,
            requested_by,
            payload,
        ))?;

        info!(job_id = %job_id, retry_count = job.retry_count, "job retry accepted");
        self.dispatcher
            .dispatch_after(job_id, self.callback_url(&job), retry.pre_dispatch_delay);

        Ok(Accepted {
            job_ref: self.job_ref(&job),
            job,
            retried: true,
        })
    }

    /// Current record of a job, by external or internal id.
    pub fn status(&self, job_ref: &str) -> Result<Job, EngineError> {
        let job_id = self.resolve(job_ref)?;
        self.store
            .get(job_id)?
            .ok_or_else(|| DomainError::not_found(job_ref).into())
    }

    /// All jobs, optionally restricted to one merchant.
    pub fn list_jobs(&self, merchant_id: Option<&str>) -> Result<Vec<Job>, EngineError> {
        let jobs = self.store.list_all()?;
        Ok(match merchant_id {
            Some(merchant) => jobs.into_iter().filter(|j| j.merchant_id == merchant).collect(),
            None => jobs,
        })
    }

    /// Audit trail of one job, oldest first.
    pub fn activities(&self, job_ref: &str) -> Result<Vec<Activity>, EngineError> {
        let job = self.status(job_ref)?;
        Ok(self.store.list_activities(job.id)?)
    }

    /// Id to show the caller for `job`.
    pub fn job_ref(&self, job: &Job) -> String {
        match self.settings.id_mode {
            IdMode::Translated => job
                .external_id
                .clone()
                .unwrap_or_else(|| self.ids.to_external(&job.id.to_string())),
            IdMode::Internal => job.id.to_string(),
        }
    }

    fn resolve(&self, job_ref: &str) -> Result<JobId, EngineError> {
        self.ids
            .to_internal(job_ref)
            .parse()
            .map_err(|_| EngineError::from(DomainError::not_found(job_ref)))
    }

    fn callback_url(&self, job: &Job) -> Option<String> {
        job.callback_url()
            .map(str::to_string)
            .or_else(|| self.settings.default_callback_url.clone())
    }
}
