//! Test doubles shared by the engine's unit and integration tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::poller::LogSource;
use super::worker::{CommandOutput, ExecutionError, ExecutionMode, ExecutionStrategy, WorkerInvocation};

/// A worker that never returns, so dispatched jobs stay in progress.
#[derive(Debug, Default)]
pub struct StalledStrategy {
    pub invocations: Mutex<Vec<WorkerInvocation>>,
}

#[async_trait]
impl LogSource for StalledStrategy {
    async fn latest_log(&self, _token: &str) -> Result<Option<String>, ExecutionError> {
        Ok(None)
    }

    async fn read_tail(&self, _locator: &str, _lines: usize) -> Result<String, ExecutionError> {
        Ok(String::new())
    }
}

#[async_trait]
impl ExecutionStrategy for StalledStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Local
    }

    async fn run(
        &self,
        invocation: &WorkerInvocation,
        _timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        std::future::pending().await
    }
}
