//! Retry gating for failed jobs.

use std::time::Duration;

use feedrun_core::DomainError;

use super::types::Job;

/// Decides whether a failed job may be resubmitted.
///
/// Retries reuse the job's id; they never create a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry budget; a job at this count cannot be retried again.
    pub max_retry_count: u32,
    /// Pause before re-dispatching, to let the worker settle after a failure.
    pub pre_dispatch_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            pre_dispatch_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retry_count: u32, pre_dispatch_delay: Duration) -> Self {
        Self {
            max_retry_count,
            pre_dispatch_delay,
        }
    }

    /// True iff the job is in its failure status and has budget left.
    pub fn can_retry(&self, job: &Job) -> bool {
        job.status.is_failed() && job.retry_count < self.max_retry_count
    }

    pub fn next_attempt(&self, job: &Job) -> u32 {
        job.retry_count + 1
    }

    /// Validate a retry request, returning the next retry count.
    pub fn check_retry(&self, job: &Job) -> Result<u32, DomainError> {
        if !job.status.is_failed() {
            return Err(DomainError::state_conflict(format!(
                "job {} cannot be retried from status {}",
                job.id, job.status
            )));
        }
        if job.retry_count >= self.max_retry_count {
            return Err(DomainError::state_conflict(format!(
                "job {} exhausted its retry budget ({}/{})",
                job.id, job.retry_count, self.max_retry_count
            )));
        }
        Ok(self.next_attempt(job))
    }
}
