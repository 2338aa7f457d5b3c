//! Orchestration engine: job store, worker execution, callbacks, config.

pub mod config;
pub mod jobs;
