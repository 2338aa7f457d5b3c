//! Job lifecycle: job types, statuses and the fixed transition table.
//!
//! Each job type owns three statuses: one in-progress, one success and one
//! failure. The engine never reasons about status strings directly; it asks
//! the [`JobType`] which status an [`Outcome`] maps to.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of feed-processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FeedValidation,
    FeedGeneration,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FeedValidation => "feed_validation",
            JobType::FeedGeneration => "feed_generation",
        }
    }

    /// Status a freshly created (or retried) job starts in.
    pub fn initial_status(&self) -> JobStatus {
        match self {
            JobType::FeedValidation => JobStatus::Validating,
            JobType::FeedGeneration => JobStatus::Generating,
        }
    }

    pub fn success_status(&self) -> JobStatus {
        match self {
            JobType::FeedValidation => JobStatus::Validated,
            JobType::FeedGeneration => JobStatus::Generated,
        }
    }

    pub fn failure_status(&self) -> JobStatus {
        match self {
            JobType::FeedValidation => JobStatus::ValidationFailed,
            JobType::FeedGeneration => JobStatus::GenerationFailed,
        }
    }

    /// Terminal status an outcome of this job type resolves to.
    pub fn status_for(&self, outcome: Outcome) -> JobStatus {
        match outcome {
            Outcome::Success => self.success_status(),
            Outcome::Failed => self.failure_status(),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed_validation" | "validation" => Ok(JobType::FeedValidation),
            "feed_generation" | "generation" => Ok(JobType::FeedGeneration),
            other => Err(DomainError::validation(format!(
                "unknown job type '{other}' (expected feed_validation or feed_generation)"
            ))),
        }
    }
}

/// Persisted job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Validating,
    Validated,
    ValidationFailed,
    Generating,
    Generated,
    GenerationFailed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Validating,
        JobStatus::Validated,
        JobStatus::ValidationFailed,
        JobStatus::Generating,
        JobStatus::Generated,
        JobStatus::GenerationFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Validating => "validating",
            JobStatus::Validated => "validated",
            JobStatus::ValidationFailed => "validation_failed",
            JobStatus::Generating => "generating",
            JobStatus::Generated => "generated",
            JobStatus::GenerationFailed => "generation_failed",
        }
    }

    pub fn job_type(&self) -> JobType {
        match self {
            JobStatus::Validating | JobStatus::Validated | JobStatus::ValidationFailed => {
                JobType::FeedValidation
            }
            JobStatus::Generating | JobStatus::Generated | JobStatus::GenerationFailed => {
                JobType::FeedGeneration
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::ValidationFailed | JobStatus::GenerationFailed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, JobStatus::Validating | JobStatus::Generating)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }

    /// Whether `next` is an edge of the transition table.
    ///
    /// - in-progress → success | failure
    /// - failure → in-progress (retry)
    /// - terminal → terminal of the same type (a late callback; last write wins)
    ///
    /// Edges across job types, and success → in-progress, do not exist.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        let ty = self.job_type();
        if next.job_type() != ty {
            return false;
        }
        if self.is_in_progress() {
            return next.is_terminal();
        }
        if next.is_in_progress() {
            return self.is_failed();
        }
        true
    }

    /// Like [`can_transition_to`](Self::can_transition_to) but as a domain error.
    pub fn ensure_transition(&self, next: JobStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::state_conflict(format!(
                "cannot move job from {self} to {next}"
            )))
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one run, as reported by the dispatcher or a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Outcome::Success),
            "failed" => Ok(Outcome::Failed),
            other => Err(DomainError::validation(format!(
                "unknown status '{other}' (expected success or failed)"
            ))),
        }
    }
}
