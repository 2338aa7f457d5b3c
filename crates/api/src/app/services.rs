use std::sync::Arc;

use feedrun_infra::config::EngineConfig;
use feedrun_infra::jobs::{
    CallbackNotifier, CallbackReconciler, Dispatcher, EngineError, ExecutionStrategy,
    FileJobStore, IdTranslator, JobService, JobStore, JobStoreError,
};

/// Engine services shared by all handlers.
pub struct AppServices {
    pub jobs: JobService,
    pub reconciler: CallbackReconciler,
}

impl AppServices {
    /// Wire the engine from configuration: JSON file store under
    /// `data_dir`, strategy per `EXECUTION_MODE`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, JobStoreError> {
        let store = Arc::new(FileJobStore::open(&config.data_dir)?);
        tracing::info!(
            data_dir = %config.data_dir.display(),
            mode = %config.execution_mode,
            id_mode = ?config.id_mode,
            "engine configured"
        );
        Ok(Self::with_parts(store, config.execution_strategy(), config))
    }

    /// Wire the engine around an explicit store and strategy.
    pub fn with_parts(
        store: Arc<dyn JobStore>,
        strategy: Arc<dyn ExecutionStrategy>,
        config: &EngineConfig,
    ) -> Self {
        let ids = Arc::new(IdTranslator::new());
        let dispatcher = Dispatcher::new(
            store.clone(),
            ids.clone(),
            strategy,
            CallbackNotifier::new(config.callback_timeout),
            config.poller(),
            config.timeouts(),
        )
        .with_max_concurrent(config.max_concurrent_jobs);

        Self {
            jobs: JobService::new(store.clone(), ids.clone(), dispatcher, config.service_settings()),
            reconciler: CallbackReconciler::new(store, ids),
        }
    }

    /// Run a synchronous engine call on tokio's blocking pool.
    pub async fn blocking<T, F>(self: &Arc<Self>, call: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&AppServices) -> Result<T, EngineError> + Send + 'static,
    {
        let services = Arc::clone(self);
        tokio::task::spawn_blocking(move || call(&services))
            .await
            .map_err(|e| EngineError::from(JobStoreError::Io(std::io::Error::other(e))))?
    }
}
