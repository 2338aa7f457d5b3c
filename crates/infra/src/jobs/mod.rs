//! Feed job orchestration engine.
//!
//! ## Design
//!
//! - Jobs move along a fixed per-type transition table (`feedrun_core::lifecycle`)
//! - Every mutation is a fetch-modify-write under the store's single lock
//! - Execution is fire-and-forget; persisted job state is the only outcome
//! - Completion is decided by the worker's log marker, never its exit code
//! - Two completion paths (dispatcher, inbound callback) converge on one
//!   idempotent status-setting operation
//!
//! ## Components
//!
//! - `JobStore`: job and activity persistence (in-memory or JSON files)
//! - `IdTranslator`: external ↔ internal id mapping
//! - `RetryPolicy`: retry gating and pre-dispatch delay
//! - `Dispatcher`: drives one run through an `ExecutionStrategy`
//! - `LogPoller`: waits for the success marker in the worker's log
//! - `CallbackNotifier` / `CallbackReconciler`: outbound and inbound webhooks
//! - `JobService`: submission, retry and queries

pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod notifier;
pub mod outcome;
pub mod poller;
pub mod reconciler;
pub mod retry;
pub mod service;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchTimeouts, Dispatcher};
pub use error::EngineError;
pub use ids::IdTranslator;
pub use notifier::{CallbackError, CallbackNotifier, CallbackPayload};
pub use outcome::{Conclusion, conclude};
pub use poller::{LogPoller, LogSource, PollOutcome};
pub use reconciler::{CallbackAck, CallbackReconciler};
pub use retry::RetryPolicy;
pub use service::{Accepted, IdMode, JobService, ServiceSettings, ValidationRequest};
pub use store::{FileJobStore, InMemoryJobStore, JobStore, JobStoreError};
pub use types::{Activity, ActivitySource, FailureRecord, FailureSource, Job, JobData, JobPatch, NewActivity};
pub use worker::{
    CommandOutput, ExecutionError, ExecutionMode, ExecutionStrategy, LocalStrategy, RemoteStrategy,
    RemoteTarget, WorkerInvocation,
};
