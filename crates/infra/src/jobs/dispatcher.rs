//! Execution dispatcher: drives one job run to completion or failure.
//!
//! `dispatch` is fire-and-forget. The caller gets a [`JoinHandle`] it may
//! ignore; the job's persisted state is the only observable outcome.
//!
//! One run:
//! 1. fetch the job (absent: logged, nothing else happens)
//! 2. build the worker invocation from `job_data`
//! 3. check strategy preconditions, wait for `run_at` if configured
//! 4. run the worker; a command failure concludes the job as failed
//! 5. poll the log for the success marker
//!
//! Local runs conclude and call back on both success and failure. Remote runs
//! call back only on failure; on success the worker posts the callback itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

use feedrun_core::JobId;

use super::ids::IdTranslator;
use super::notifier::{CallbackNotifier, CallbackPayload};
use super::outcome::{Conclusion, conclude};
use super::poller::{LogPoller, PollOutcome};
use super::store::{self, JobStore, JobStoreError};
use super::types::{FailureSource, Job};
use super::worker::{ExecutionError, ExecutionMode, ExecutionStrategy, WorkerInvocation, delay_until};

/// Timeouts applied to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTimeouts {
    /// Hard limit on the worker command (and each remote copy).
    pub command: Duration,
    /// How long to wait for the success marker after the command returns.
    pub log_check: Duration,
}

impl Default for DispatchTimeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(300),
            log_check: Duration::from_secs(300),
        }
    }
}

/// Supervises job runs on one execution strategy.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    ids: Arc<IdTranslator>,
    strategy: Arc<dyn ExecutionStrategy>,
    notifier: CallbackNotifier,
    poller: LogPoller,
    timeouts: DispatchTimeouts,
    permits: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        ids: Arc<IdTranslator>,
        strategy: Arc<dyn ExecutionStrategy>,
        notifier: CallbackNotifier,
        poller: LogPoller,
        timeouts: DispatchTimeouts,
    ) -> Self {
        Self {
            store,
            ids,
            strategy,
            notifier,
            poller,
            timeouts,
            permits: None,
        }
    }

    /// Bound the number of concurrently running jobs. `0` keeps it unbounded.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.strategy.mode()
    }

    /// Start a run in the background and return immediately.
    pub fn dispatch(&self, job_id: JobId, callback_url: Option<String>) -> JoinHandle<Option<Job>> {
        self.dispatch_after(job_id, callback_url, Duration::ZERO)
    }

    /// Like [`dispatch`](Self::dispatch), but the background task first
    /// waits for `delay`.
    pub fn dispatch_after(
        &self,
        job_id: JobId,
        callback_url: Option<String>,
        delay: Duration,
    ) -> JoinHandle<Option<Job>> {
        let this = self.clone();
        let span = info_span!("dispatch", job_id = %job_id, mode = %self.strategy.mode());

        tokio::spawn(
            async move {
                if !delay.is_zero() {
                    debug!(delay_ms = delay.as_millis() as u64, "delaying dispatch");
                    tokio::time::sleep(delay).await;
                }

                let worker = this.clone();
                let url = callback_url.clone();
                let run = tokio::spawn(async move { worker.run(job_id, url).await }.in_current_span());
                match run.await {
                    Ok(job) => job,
                    Err(e) => {
                        error!(error = %e, "job run aborted");
                        let job = this.load(job_id).await.ok().flatten()?;
                        let url = this.callback_url(&job, callback_url);
                        let conclusion = Conclusion::failed(job.job_type, format!("job run aborted: {e}"));
                        this.finish(&job, url.as_deref(), conclusion).await
                    }
                }
            }
            .instrument(span),
        )
    }

    /// Run one job to its conclusion in the current task.
    ///
    /// Returns the job as last written, or `None` when it does not exist.
    pub async fn run(&self, job_id: JobId, callback_url: Option<String>) -> Option<Job> {
        let _permit = match &self.permits {
            Some(permits) => permits.clone().acquire_owned().await.ok(),
            None => None,
        };

        let job = match self.load(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job_id = %job_id, "job not found; nothing to dispatch");
                return None;
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to load job");
                return None;
            }
        };
        let callback_url = self.callback_url(&job, callback_url);

        match self.execute(&job).await {
            Ok(PollOutcome::Finished { destination, .. }) => match self.strategy.mode() {
                ExecutionMode::Local => {
                    let conclusion = Conclusion::success(job.job_type, destination);
                    self.finish(&job, callback_url.as_deref(), conclusion).await
                }
                ExecutionMode::Remote => {
                    info!(destination = ?destination, "worker finished; awaiting its callback");
                    self.load(job_id).await.ok().flatten()
                }
            },
            Ok(PollOutcome::TimedOut { tail }) => {
                let error = ExecutionError::PollTimeout { tail };
                warn!(error = %error, "worker did not report success in time");
                let conclusion = Conclusion::failed(job.job_type, error.to_string());
                self.finish(&job, callback_url.as_deref(), conclusion).await
            }
            Err(error) => {
                warn!(error = %error, "worker execution failed");
                let conclusion = Conclusion::failed(job.job_type, error.to_string());
                self.finish(&job, callback_url.as_deref(), conclusion).await
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<PollOutcome, ExecutionError> {
        let invocation = invocation_for(job)?;
        self.strategy.ensure_ready()?;

        if let Some(run_at) = self.strategy.run_at() {
            let wait = delay_until(run_at, Local::now().naive_local());
            info!(run_at = %run_at, wait_secs = wait.as_secs(), "deferring worker invocation");
            tokio::time::sleep(wait).await;
        }

        info!(token = %invocation.token, "starting worker");
        let output = self.strategy.run(&invocation, self.timeouts.command).await?;
        debug!(duration_ms = output.duration_ms, "worker command returned");

        let deadline = Instant::now() + self.timeouts.log_check;
        Ok(self
            .poller
            .poll(self.strategy.as_ref(), &invocation.token, deadline)
            .await)
    }

    /// Persist the conclusion, then call back. A failed callback never
    /// undoes the persisted status.
    async fn finish(&self, job: &Job, callback_url: Option<&str>, conclusion: Conclusion) -> Option<Job> {
        let (job_id, recorded) = (job.id, conclusion.clone());
        let concluded = store::blocking(&self.store, move |store| {
            store.update_with(job_id, &mut |current| {
                conclude(current, &recorded, FailureSource::Dispatcher).map_err(JobStoreError::from)
            })
        });
        let updated = match concluded.await {
            Ok(updated) => {
                info!(job_id = %updated.id, status = %updated.status, "job concluded");
                Some(updated)
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "failed to record job outcome");
                None
            }
        };

        let payload = CallbackPayload::new(
            self.external_id(job),
            conclusion.job_type,
            conclusion.outcome,
            conclusion.destination.as_deref(),
            conclusion.error.as_deref(),
        );
        self.notifier.notify_best_effort(callback_url, &payload).await;
        updated
    }

    async fn load(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        store::blocking(&self.store, move |store| store.get(job_id)).await
    }

    fn callback_url(&self, job: &Job, requested: Option<String>) -> Option<String> {
        requested.or_else(|| job.callback_url().map(str::to_string))
    }

    fn external_id(&self, job: &Job) -> String {
        job.external_id
            .clone()
            .unwrap_or_else(|| self.ids.to_external(&job.id.to_string()))
    }
}

/// Per-run distinguishing token: the caller's `distinguish_id`, or one
/// derived from the job id and attempt number.
pub fn run_token(job: &Job) -> String {
    match job.distinguish_id() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => format!("{}-r{}", job.id, job.retry_count),
    }
}

fn invocation_for(job: &Job) -> Result<WorkerInvocation, ExecutionError> {
    let (Some(source), Some(destination)) = (job.source_path(), job.destination_path()) else {
        return Err(ExecutionError::Precondition(
            "job is missing source_path or destination_path".to_string(),
        ));
    };
    Ok(WorkerInvocation {
        partner_id: job.partner_id.clone(),
        source_path: source.to_string(),
        destination_path: destination.to_string(),
        token: run_token(job),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::poller::LogSource;
    use crate::jobs::store::InMemoryJobStore;
    use crate::jobs::types::{Activity, JobData, JobPatch, NewActivity, keys};
    use crate::jobs::worker::CommandOutput;
    use async_trait::async_trait;
    use axum::{Json, Router, routing::post};
    use feedrun_core::{ActivityId, JobStatus, JobType};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SUCCESS_LOG: &str = "Upload completed: s3://a/out/result.csv\nScript finished successfully at: now";

    struct FakeStrategy {
        mode: ExecutionMode,
        ready: bool,
        fail_with: Option<String>,
        log: Option<String>,
        run_time: Duration,
        invocations: Mutex<Vec<WorkerInvocation>>,
        log_reads: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl FakeStrategy {
        fn new(mode: ExecutionMode) -> Self {
            Self {
                mode,
                ready: true,
                fail_with: None,
                log: Some(SUCCESS_LOG.to_string()),
                run_time: Duration::ZERO,
                invocations: Mutex::new(Vec::new()),
                log_reads: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LogSource for FakeStrategy {
        async fn latest_log(&self, token: &str) -> Result<Option<String>, ExecutionError> {
            self.log_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.log.as_ref().map(|_| format!("/logs/{token}.log")))
        }

        async fn read_tail(&self, _locator: &str, _lines: usize) -> Result<String, ExecutionError> {
            Ok(self.log.clone().unwrap_or_default())
        }
    }

    #[async_trait]
    impl ExecutionStrategy for FakeStrategy {
        fn mode(&self) -> ExecutionMode {
            self.mode
        }

        fn ensure_ready(&self) -> Result<(), ExecutionError> {
            if self.ready {
                Ok(())
            } else {
                Err(ExecutionError::Precondition("Missing ec2_host or key_path".into()))
            }
        }

        async fn run(
            &self,
            invocation: &WorkerInvocation,
            _timeout: Duration,
        ) -> Result<CommandOutput, ExecutionError> {
            self.invocations.lock().unwrap().push(invocation.clone());
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(self.run_time).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            match &self.fail_with {
                Some(stderr) => Err(ExecutionError::NonZeroExit {
                    command: "bash worker.sh".into(),
                    code: 1,
                    stderr: stderr.clone(),
                }),
                None => Ok(CommandOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: 0,
                    duration_ms: 1,
                }),
            }
        }
    }

    async fn hook() -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    Json(json!({"received": true}))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), received)
    }

    fn dispatcher(store: Arc<InMemoryJobStore>, strategy: Arc<FakeStrategy>) -> Dispatcher {
        let poller = LogPoller::new(Duration::from_millis(10));
        let timeouts = DispatchTimeouts {
            command: Duration::from_secs(5),
            log_check: Duration::from_millis(100),
        };
        Dispatcher::new(
            store,
            Arc::new(IdTranslator::new()),
            strategy,
            CallbackNotifier::default(),
            poller,
            timeouts,
        )
    }

    fn create_job(store: &InMemoryJobStore) -> JobId {
        let data = json!({
            "source_path": "s3://a/in",
            "destination_path": "s3://a/out"
        });
        let job = Job::new(
            "m-1",
            "p-1",
            JobType::FeedValidation,
            data.as_object().cloned().unwrap(),
        )
        .with_external_id("ext-1");
        store.insert(job).unwrap()
    }

    #[tokio::test]
    async fn local_success_validates_and_calls_back() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));
        let (url, received) = hook().await;
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), strategy.clone())
            .dispatch(job_id, Some(url))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(job.status, JobStatus::Validated);
        assert_eq!(job.result_path(), Some("s3://a/out/result.csv"));

        let invocations = strategy.invocations.lock().unwrap();
        assert_eq!(
            invocations[0].args(),
            ["p-1", "s3://a/in", "s3://a/out", format!("{job_id}-r0").as_str()]
        );

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["job_id"], "ext-1");
        assert_eq!(received[0]["status"], "success");
        assert_eq!(received[0]["result"]["destination_s3_path"], "s3://a/out/result.csv");
    }

    #[tokio::test]
    async fn command_failure_fails_the_job_without_polling() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Local);
        fake.fail_with = Some("feed has no header row".into());
        let strategy = Arc::new(fake);
        let (url, received) = hook().await;
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), strategy.clone())
            .run(job_id, Some(url))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::ValidationFailed);
        let failures = job.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].error.contains("feed has no header row"));
        assert_eq!(failures[0].source, FailureSource::Dispatcher);
        assert_eq!(strategy.log_reads.load(Ordering::SeqCst), 0);

        let received = received.lock().unwrap();
        assert_eq!(received[0]["status"], "failed");
        assert!(received[0]["err"].as_str().unwrap().contains("feed has no header row"));
    }

    #[tokio::test]
    async fn missing_marker_times_out_with_the_log_tail() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Local);
        fake.log = Some("row 1 ok\nrow 2 ok".into());
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), Arc::new(fake))
            .run(job_id, None)
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::ValidationFailed);
        let error = &job.failures()[0].error;
        assert!(error.starts_with("Timeout waiting for success marker"));
        assert!(error.ends_with("row 1 ok\nrow 2 ok"));
    }

    #[tokio::test]
    async fn remote_success_leaves_the_conclusion_to_the_worker_callback() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Remote));
        let (url, received) = hook().await;
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), strategy)
            .run(job_id, Some(url))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Validating);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_precondition_failure_is_reported() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Remote);
        fake.ready = false;
        let strategy = Arc::new(fake);
        let (url, received) = hook().await;
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), strategy.clone())
            .run(job_id, Some(url))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::ValidationFailed);
        assert!(strategy.invocations.lock().unwrap().is_empty());
        let received = received.lock().unwrap();
        assert_eq!(received[0]["status"], "failed");
        assert_eq!(received[0]["err"], "Missing ec2_host or key_path");
    }

    #[tokio::test]
    async fn failure_is_persisted_even_when_the_callback_cannot_be_delivered() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Local);
        fake.fail_with = Some("boom".into());
        let job_id = create_job(&store);

        let job = dispatcher(store.clone(), Arc::new(fake))
            .run(job_id, Some("http://127.0.0.1:9/unreachable".into()))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::ValidationFailed);
        assert_eq!(store.get(job_id).unwrap().unwrap().status, JobStatus::ValidationFailed);
    }

    #[tokio::test]
    async fn unknown_job_is_a_no_op() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));

        let result = dispatcher(store, strategy.clone()).run(JobId::new(), None).await;

        assert!(result.is_none());
        assert!(strategy.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn job_without_paths_fails_before_running() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));
        let job_id = store
            .create("m", "p", JobType::FeedGeneration, JobData::new())
            .unwrap();

        let job = dispatcher(store, strategy.clone()).run(job_id, None).await.unwrap();

        assert_eq!(job.status, JobStatus::GenerationFailed);
        assert!(strategy.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn caller_token_and_retry_attempt_shape_the_invocation() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));
        let job_id = create_job(&store);
        let dispatcher = dispatcher(store.clone(), strategy.clone());

        store.update(job_id, JobPatch::new().retry_count(2)).unwrap();
        dispatcher.run(job_id, None).await;

        let mut data = store.get(job_id).unwrap().unwrap().job_data;
        data.insert(keys::DISTINGUISH_ID.into(), json!("batch-42"));
        store
            .update(job_id, JobPatch::new().status(JobStatus::Validating).job_data(data))
            .unwrap();
        dispatcher.run(job_id, None).await;

        let invocations = strategy.invocations.lock().unwrap();
        assert_eq!(invocations[0].token, format!("{job_id}-r2"));
        assert_eq!(invocations[1].token, "batch-42");
    }

    #[tokio::test]
    async fn local_success_resets_retries_without_a_callback_round_trip() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));
        let job_id = create_job(&store);
        store.update(job_id, JobPatch::new().retry_count(2)).unwrap();

        let job = dispatcher(store.clone(), strategy).run(job_id, None).await.unwrap();

        assert_eq!(job.status, JobStatus::Validated);
        assert_eq!(job.retry_count, 0);
        assert_eq!(store.get(job_id).unwrap().unwrap().retry_count, 0);
    }

    #[tokio::test]
    async fn local_failure_keeps_the_retry_count() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Local);
        fake.fail_with = Some("exit 1".into());
        let job_id = create_job(&store);
        store.update(job_id, JobPatch::new().retry_count(2)).unwrap();

        let job = dispatcher(store.clone(), Arc::new(fake)).run(job_id, None).await.unwrap();

        assert_eq!(job.status, JobStatus::ValidationFailed);
        assert_eq!(job.retry_count, 2);
    }

    /// Delegating store that records which thread each read and write ran on.
    #[derive(Default)]
    struct ThreadRecordingStore {
        inner: InMemoryJobStore,
        threads: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl ThreadRecordingStore {
        fn record(&self) {
            self.threads.lock().unwrap().push(std::thread::current().id());
        }
    }

    impl JobStore for ThreadRecordingStore {
        fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
            self.inner.insert(job)
        }

        fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
            self.record();
            self.inner.get(job_id)
        }

        fn update_with(
            &self,
            job_id: JobId,
            modify: &mut dyn FnMut(&Job) -> Result<JobPatch, JobStoreError>,
        ) -> Result<Job, JobStoreError> {
            self.record();
            self.inner.update_with(job_id, modify)
        }

        fn record_activity(&self, activity: NewActivity) -> Result<ActivityId, JobStoreError> {
            self.inner.record_activity(activity)
        }

        fn list_activities(&self, entity_id: JobId) -> Result<Vec<Activity>, JobStoreError> {
            self.inner.list_activities(entity_id)
        }

        fn list_all(&self) -> Result<Vec<Job>, JobStoreError> {
            self.inner.list_all()
        }
    }

    #[tokio::test]
    async fn store_calls_stay_off_the_runtime_thread() {
        let store = Arc::new(ThreadRecordingStore::default());
        let job_id = create_job(&store.inner);
        let dispatcher = Dispatcher::new(
            store.clone(),
            Arc::new(IdTranslator::new()),
            Arc::new(FakeStrategy::new(ExecutionMode::Local)),
            CallbackNotifier::default(),
            LogPoller::new(Duration::from_millis(10)),
            DispatchTimeouts::default(),
        );

        let job = dispatcher.run(job_id, None).await.unwrap();

        assert_eq!(job.status, JobStatus::Validated);
        let runtime_thread = std::thread::current().id();
        let threads = store.threads.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|t| *t != runtime_thread));
    }

    #[tokio::test]
    async fn concurrency_bound_serializes_runs() {
        let store = InMemoryJobStore::arc();
        let mut fake = FakeStrategy::new(ExecutionMode::Local);
        fake.run_time = Duration::from_millis(30);
        let strategy = Arc::new(fake);
        let dispatcher = dispatcher(store.clone(), strategy.clone()).with_max_concurrent(1);

        let handles: Vec<_> = (0..3)
            .map(|_| dispatcher.dispatch(create_job(&store), None))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(strategy.invocations.lock().unwrap().len(), 3);
        assert_eq!(strategy.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_after_waits_before_running() {
        let store = InMemoryJobStore::arc();
        let strategy = Arc::new(FakeStrategy::new(ExecutionMode::Local));
        let job_id = create_job(&store);
        let start = Instant::now();

        dispatcher(store, strategy)
            .dispatch_after(job_id, None, Duration::from_millis(300))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
