//! Job storage implementations.
//!
//! Every store serializes all reads and writes behind one store-wide lock.
//! Job volume is low, so correctness wins over throughput; list and lookup
//! queries are O(n) scans under that lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use feedrun_core::{ActivityId, DomainError, JobId, JobType};

use super::types::{Activity, Job, JobData, JobPatch, NewActivity};

/// Job store abstraction.
pub trait JobStore: Send + Sync {
    /// Persist a fully-formed job record.
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError>;

    /// Get a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Atomic fetch-modify-write of one record.
    ///
    /// `modify` sees the current record under the store lock and returns the
    /// patch to merge. Returning an error aborts the write.
    fn update_with(
        &self,
        job_id: JobId,
        modify: &mut dyn FnMut(&Job) -> Result<JobPatch, JobStoreError>,
    ) -> Result<Job, JobStoreError>;

    /// Append an immutable activity record.
    fn record_activity(&self, activity: NewActivity) -> Result<ActivityId, JobStoreError>;

    /// Activities for one entity, ordered by `created_at`.
    fn list_activities(&self, entity_id: JobId) -> Result<Vec<Activity>, JobStoreError>;

    /// Every job, ordered by `created_at`.
    fn list_all(&self) -> Result<Vec<Job>, JobStoreError>;

    /// First job (by `created_at`) for a merchant.
    fn find_by_merchant(&self, merchant_id: &str) -> Result<Option<Job>, JobStoreError> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|j| j.merchant_id == merchant_id))
    }

    /// Create a job in its type's initial status.
    fn create(
        &self,
        merchant_id: &str,
        partner_id: &str,
        job_type: JobType,
        job_data: JobData,
    ) -> Result<JobId, JobStoreError> {
        self.insert(Job::new(merchant_id, partner_id, job_type, job_data))
    }

    /// Merge a fixed patch into a record.
    fn update(&self, job_id: JobId, patch: JobPatch) -> Result<Job, JobStoreError> {
        self.update_with(job_id, &mut |_| Ok(patch.clone()))
    }
}

/// Run a store call on tokio's blocking pool.
///
/// Store calls take a lock and may touch the filesystem, so async callers go
/// through here instead of calling the store on a runtime worker.
pub async fn blocking<T, F>(store: &Arc<dyn JobStore>, call: F) -> Result<T, JobStoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn JobStore) -> Result<T, JobStoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| JobStoreError::Io(std::io::Error::other(e)))?
}

/// Job store error.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    /// A fetch-modify-write was refused by the caller's own check.
    #[error(transparent)]
    Rejected(#[from] DomainError),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// In-memory job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    jobs: HashMap<JobId, Job>,
    activities: Vec<Activity>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn state(&self) -> Result<MutexGuard<'_, InMemoryState>, JobStoreError> {
        self.inner.lock().map_err(|_| JobStoreError::Poisoned)
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        let mut state = self.state()?;
        if state.jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        state.jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(self.state()?.jobs.get(&job_id).cloned())
    }

    fn update_with(
        &self,
        job_id: JobId,
        modify: &mut dyn FnMut(&Job) -> Result<JobPatch, JobStoreError>,
    ) -> Result<Job, JobStoreError> {
        let mut state = self.state()?;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or(JobStoreError::NotFound(job_id))?;
        let patch = modify(job)?;
        job.apply(patch);
        Ok(job.clone())
    }

    fn record_activity(&self, activity: NewActivity) -> Result<ActivityId, JobStoreError> {
        let mut state = self.state()?;
        let activity = activity.into_activity(Utc::now());
        let id = activity.id;
        state.activities.push(activity);
        Ok(id)
    }

    fn list_activities(&self, entity_id: JobId) -> Result<Vec<Activity>, JobStoreError> {
        let state = self.state()?;
        let mut result: Vec<_> = state
            .activities
            .iter()
            .filter(|a| a.entity_id == entity_id)
            .cloned()
            .collect();
        // Stable sort: ties keep insertion order.
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    fn list_all(&self) -> Result<Vec<Job>, JobStoreError> {
        let state = self.state()?;
        let mut result: Vec<_> = state.jobs.values().cloned().collect();
        result.sort_by_key(|j| (j.created_at, j.id));
        Ok(result)
    }
}

/// Durable store: one pretty-printed JSON file per job and per activity.
///
/// Layout under `root`:
/// - `jobs/<job_id>.json`
/// - `activities/<activity_id>.json`
///
/// Each record is written to a temporary sibling and renamed into place, so a
/// reader never observes a half-written record.
#[derive(Debug)]
pub struct FileJobStore {
    jobs_dir: PathBuf,
    activities_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileJobStore {
    /// Open (creating directories if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, JobStoreError> {
        let root = root.as_ref();
        let jobs_dir = root.join("jobs");
        let activities_dir = root.join("activities");
        fs::create_dir_all(&jobs_dir)?;
        fs::create_dir_all(&activities_dir)?;
        Ok(Self {
            jobs_dir,
            activities_dir,
            lock: Mutex::new(()),
        })
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, JobStoreError> {
        self.lock.lock().map_err(|_| JobStoreError::Poisoned)
    }

    fn job_path(&self, job_id: JobId) -> PathBuf {
        self.jobs_dir.join(format!("{job_id}.json"))
    }

    fn read_job(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        let path = self.job_path(job_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), JobStoreError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn scan<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>, JobStoreError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            out.push(serde_json::from_slice(&fs::read(&path)?)?);
        }
        Ok(out)
    }
}

impl JobStore for FileJobStore {
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        let _guard = self.guard()?;
        let path = self.job_path(job.id);
        if path.exists() {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        Self::write_json(&path, &job)?;
        Ok(job.id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        let _guard = self.guard()?;
        self.read_job(job_id)
    }

    fn update_with(
        &self,
        job_id: JobId,
        modify: &mut dyn FnMut(&Job) -> Result<JobPatch, JobStoreError>,
    ) -> Result<Job, JobStoreError> {
        let _guard = self.guard()?;
        let mut job = self
            .read_job(job_id)?
            .ok_or(JobStoreError::NotFound(job_id))?;
        let patch = modify(&job)?;
        job.apply(patch);
        Self::write_json(&self.job_path(job_id), &job)?;
        Ok(job)
    }

    fn record_activity(&self, activity: NewActivity) -> Result<ActivityId, JobStoreError> {
        let _guard = self.guard()?;
        let activity = activity.into_activity(Utc::now());
        let path = self.activities_dir.join(format!("{}.json", activity.id));
        Self::write_json(&path, &activity)?;
        Ok(activity.id)
    }

    fn list_activities(&self, entity_id: JobId) -> Result<Vec<Activity>, JobStoreError> {
        let _guard = self.guard()?;
        let mut result: Vec<Activity> = Self::scan::<Activity>(&self.activities_dir)?
            .into_iter()
            .filter(|a| a.entity_id == entity_id)
            .collect();
        result.sort_by_key(|a| (a.created_at, a.id));
        Ok(result)
    }

    fn list_all(&self) -> Result<Vec<Job>, JobStoreError> {
        let _guard = self.guard()?;
        let mut result: Vec<Job> = Self::scan(&self.jobs_dir)?;
        result.sort_by_key(|j| (j.created_at, j.id));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::ActivitySource;
    use feedrun_core::JobStatus;
    use serde_json::json;

    fn paths() -> JobData {
        json!({"source_path": "s3://a/in", "destination_path": "s3://a/out"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn exercise_store(store: &dyn JobStore) {
        let id = store
            .create("m-1", "p-1", JobType::FeedValidation, paths())
            .unwrap();

        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Validating);
        assert_eq!(job.destination_path(), Some("s3://a/out"));

        let updated = store
            .update(id, JobPatch::new().status(JobStatus::Validated))
            .unwrap();
        assert_eq!(updated.status, JobStatus::Validated);
        assert!(updated.updated_at > job.updated_at);
        assert_eq!(store.get(id).unwrap().unwrap(), updated);

        let first = store
            .record_activity(NewActivity::for_job(id, ActivitySource::Ui, "alice", json!({"n": 1})))
            .unwrap();
        let second = store
            .record_activity(NewActivity::for_job(
                id,
                ActivitySource::Callback,
                "callback",
                json!({"n": 2}),
            ))
            .unwrap();
        store
            .record_activity(NewActivity::for_job(JobId::new(), ActivitySource::Ui, "bob", json!({})))
            .unwrap();

        let activities = store.list_activities(id).unwrap();
        assert_eq!(
            activities.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![first, second]
        );

        assert_eq!(store.find_by_merchant("m-1").unwrap().unwrap().id, id);
        assert!(store.find_by_merchant("nope").unwrap().is_none());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn in_memory_store_contract() {
        exercise_store(&InMemoryJobStore::new());
    }

    #[test]
    fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&FileJobStore::open(dir.path()).unwrap());
    }

    #[test]
    fn update_of_unknown_job_is_not_found() {
        let store = InMemoryJobStore::new();
        let missing = JobId::new();

        let err = store.update(missing, JobPatch::new()).unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(id) if id == missing));
    }

    #[test]
    fn rejected_modification_leaves_record_untouched() {
        let store = InMemoryJobStore::new();
        let id = store
            .create("m", "p", JobType::FeedValidation, JobData::new())
            .unwrap();
        let before = store.get(id).unwrap().unwrap();

        let err = store
            .update_with(id, &mut |_| Err(DomainError::state_conflict("no").into()))
            .unwrap_err();

        assert!(matches!(err, JobStoreError::Rejected(DomainError::StateConflict(_))));
        assert_eq!(store.get(id).unwrap().unwrap(), before);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = FileJobStore::open(dir.path()).unwrap();
            store
                .create("m", "p", JobType::FeedGeneration, paths())
                .unwrap()
        };

        let reopened = FileJobStore::open(dir.path()).unwrap();
        let job = reopened.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Generating);
        assert!(dir.path().join("jobs").join(format!("{id}.json")).exists());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryJobStore::new();
        let job = Job::new("m", "p", JobType::FeedValidation, JobData::new());
        store.insert(job.clone()).unwrap();

        assert!(matches!(
            store.insert(job),
            Err(JobStoreError::AlreadyExists(_))
        ));
    }
}
