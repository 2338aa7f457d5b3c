//! Engine-level error returned by the service and reconciler.

use feedrun_core::DomainError;

use super::store::JobStoreError;

/// Failure of a synchronous engine operation.
///
/// Domain failures map to client errors; everything else is a storage fault.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(JobStoreError),
}

impl From<JobStoreError> for EngineError {
    fn from(err: JobStoreError) -> Self {
        match err {
            JobStoreError::Rejected(domain) => EngineError::Domain(domain),
            JobStoreError::NotFound(id) => EngineError::Domain(DomainError::not_found(id.to_string())),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            EngineError::Domain(d) => Some(d),
            EngineError::Store(_) => None,
        }
    }
}
