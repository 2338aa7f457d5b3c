//! Worker log polling.
//!
//! Completion is defined exclusively by the success marker in the worker's
//! log, never by process exit code. A missing log and a log without the
//! marker both end in the same [`PollOutcome::TimedOut`].

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::worker::ExecutionError;

/// Literal line the worker writes when it finished successfully.
pub const SUCCESS_MARKER: &str = "Script finished successfully";

static UPLOAD_COMPLETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Upload completed:\s*(s3://\S+)").expect("static regex")
});

/// Where worker logs can be found and read.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Locator of the most recently modified log matching `token`, if any.
    async fn latest_log(&self, token: &str) -> Result<Option<String>, ExecutionError>;

    /// Last `lines` lines of the log at `locator`.
    async fn read_tail(&self, locator: &str, lines: usize) -> Result<String, ExecutionError>;
}

/// Result of one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Marker found. `destination` is the uploaded path when the log names one.
    Finished {
        destination: Option<String>,
        tail: String,
    },
    /// Deadline reached without the marker; `tail` is the last tail observed.
    TimedOut { tail: String },
}

impl PollOutcome {
    /// `(destination, tail)` view of the outcome.
    pub fn into_parts(self) -> (Option<String>, String) {
        match self {
            PollOutcome::Finished { destination, tail } => (destination, tail),
            PollOutcome::TimedOut { tail } => (None, tail),
        }
    }
}

/// Scan a log tail: `None` without the success marker, otherwise the
/// upload destination (if one is logged).
pub fn scan_log(tail: &str) -> Option<Option<String>> {
    if !tail.contains(SUCCESS_MARKER) {
        return None;
    }
    Some(
        UPLOAD_COMPLETED
            .captures(tail)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    )
}

/// Last `lines` lines of `content`.
pub fn tail_lines(content: &str, lines: usize) -> String {
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Repeatedly reads a worker's log until the marker appears or time runs out.
#[derive(Debug, Clone)]
pub struct LogPoller {
    pub poll_interval: Duration,
    pub tail_lines: usize,
}

impl Default for LogPoller {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            tail_lines: 200,
        }
    }
}

impl LogPoller {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }

    /// Poll `source` for the log matching `token` until `deadline`.
    ///
    /// Read failures are logged and retried like a missing log. A
    /// [`PollOutcome::TimedOut`] is only returned once `deadline` has passed.
    pub async fn poll<S>(&self, source: &S, token: &str, deadline: Instant) -> PollOutcome
    where
        S: LogSource + ?Sized,
    {
        let mut last_tail = String::new();

        loop {
            let now = Instant::now();
            if now >= deadline {
                return PollOutcome::TimedOut { tail: last_tail };
            }

            match source.latest_log(token).await {
                Ok(Some(locator)) => match source.read_tail(&locator, self.tail_lines).await {
                    Ok(tail) => {
                        if let Some(destination) = scan_log(&tail) {
                            debug!(token, log = %locator, "success marker found");
                            return PollOutcome::Finished { destination, tail };
                        }
                        debug!(token, log = %locator, "success marker not found yet");
                        last_tail = tail;
                    }
                    Err(e) => warn!(token, log = %locator, error = %e, "failed to read log tail"),
                },
                Ok(None) => debug!(token, "no log file yet"),
                Err(e) => warn!(token, error = %e, "failed to locate log"),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
