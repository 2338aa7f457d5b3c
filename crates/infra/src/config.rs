//! Configuration loading and representation.
//!
//! All settings come from environment variables. `main` loads a `.env` file
//! first, so local overrides work without exporting anything.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;

use crate::jobs::{
    DispatchTimeouts, ExecutionMode, ExecutionStrategy, IdMode, LocalStrategy, LogPoller,
    RemoteStrategy, RemoteTarget, RetryPolicy, ServiceSettings, worker::parse_run_at,
};

/// Malformed configuration value.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: '{value}' ({reason})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything the engine needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub execution_mode: ExecutionMode,
    pub ec2_host: Option<String>,
    pub ec2_user: String,
    pub ec2_key_path: Option<PathBuf>,
    pub run_at: Option<NaiveTime>,
    pub worker_script: PathBuf,
    pub logs_dir: PathBuf,
    pub remote_logs_dir: String,
    pub command_timeout: Duration,
    pub log_check_timeout: Duration,
    pub log_poll_interval: Duration,
    pub max_retry_count: u32,
    pub retry_delay: Duration,
    pub callback_url: Option<String>,
    pub callback_timeout: Duration,
    pub data_dir: PathBuf,
    pub id_mode: IdMode,
    pub strict_paths: bool,
    /// `0` means unbounded.
    pub max_concurrent_jobs: usize,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let execution_mode = parsed(&get, "EXECUTION_MODE", ExecutionMode::Local)?;
        let ec2_user = get("EC2_USER").unwrap_or_else(|| "ec2-user".to_string());
        let run_at = match get("RUN_AT") {
            Some(raw) => Some(parse_run_at(&raw).map_err(|e| ConfigError {
                key: "RUN_AT",
                value: raw.clone(),
                reason: format!("expected HH:MM or HH:MM:SS: {e}"),
            })?),
            None => None,
        };
        let default_poll = match execution_mode {
            ExecutionMode::Local => 10,
            ExecutionMode::Remote => 5,
        };
        let remote_logs_dir = get("REMOTE_LOGS_DIR")
            .unwrap_or_else(|| format!("/home/{ec2_user}/Feed_API/Feed_API/scripts/logs"));

        Ok(Self {
            execution_mode,
            ec2_host: get("EC2_HOST"),
            ec2_key_path: get("EC2_KEY_PATH").map(PathBuf::from),
            run_at,
            worker_script: get("WORKER_SCRIPT")
                .unwrap_or_else(|| "./scripts/analyze_feed.sh".to_string())
                .into(),
            logs_dir: get("LOGS_DIR").unwrap_or_else(|| "./logs".to_string()).into(),
            remote_logs_dir,
            command_timeout: Duration::from_secs(parsed(&get, "COMMAND_TIMEOUT_SECS", 300)?),
            log_check_timeout: Duration::from_secs(parsed(&get, "LOG_CHECK_TIMEOUT", 300)?),
            log_poll_interval: Duration::from_secs(positive(&get, "LOG_POLL_INTERVAL", default_poll)?),
            max_retry_count: parsed(&get, "MAX_RETRY_COUNT", 3)?,
            retry_delay: Duration::from_millis(parsed(&get, "RETRY_DELAY_MS", 300)?),
            callback_url: get("CALLBACK_URL"),
            callback_timeout: Duration::from_secs(parsed(&get, "CALLBACK_TIMEOUT_SECS", 30)?),
            data_dir: get("DATA_DIR").unwrap_or_else(|| "./data".to_string()).into(),
            id_mode: parsed(&get, "ID_MODE", IdMode::Translated)?,
            strict_paths: match get("STRICT_PATHS") {
                Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                    key: "STRICT_PATHS",
                    value: raw.clone(),
                    reason: "expected true/false".to_string(),
                })?,
                None => true,
            },
            max_concurrent_jobs: parsed(&get, "MAX_CONCURRENT_JOBS", 0)?,
            ec2_user,
        })
    }

    /// Execution strategy for the configured mode.
    pub fn execution_strategy(&self) -> Arc<dyn ExecutionStrategy> {
        match self.execution_mode {
            ExecutionMode::Local => Arc::new(LocalStrategy::new(&self.worker_script, &self.logs_dir)),
            ExecutionMode::Remote => Arc::new(RemoteStrategy::new(
                &self.worker_script,
                RemoteTarget {
                    host: self.ec2_host.clone(),
                    user: self.ec2_user.clone(),
                    key_path: self.ec2_key_path.clone(),
                    logs_dir: self.remote_logs_dir.clone(),
                    run_at: self.run_at,
                },
            )),
        }
    }

    pub fn poller(&self) -> LogPoller {
        LogPoller::new(self.log_poll_interval)
    }

    pub fn timeouts(&self) -> DispatchTimeouts {
        DispatchTimeouts {
            command: self.command_timeout,
            log_check: self.log_check_timeout,
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            retry: RetryPolicy::new(self.max_retry_count, self.retry_delay),
            id_mode: self.id_mode,
            strict_paths: self.strict_paths,
            default_callback_url: self.callback_url.clone(),
        }
    }
}

fn parsed<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Like [`parsed`], but rejects 0.
fn positive<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parsed(get, key, default)?;
    if value == 0 {
        return Err(ConfigError {
            key,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

/// Accepts `1/0`, `true/false`, `yes/no`, `on/off` (case-insensitive).
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
