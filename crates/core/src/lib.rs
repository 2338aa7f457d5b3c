//! `feedrun-core`: domain foundation for the feed job engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, and the job lifecycle table.

pub mod error;
pub mod id;
pub mod lifecycle;

pub use error::{DomainError, DomainResult};
pub use id::{ActivityId, JobId};
pub use lifecycle::{JobStatus, JobType, Outcome};
