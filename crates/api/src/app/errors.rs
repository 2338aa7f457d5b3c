use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use feedrun_core::DomainError;
use feedrun_infra::jobs::EngineError;

use crate::app::dto::JobEnvelope;

pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
        EngineError::Domain(
            DomainError::Validation(_) | DomainError::InvalidId(_) | DomainError::StateConflict(_),
        ) => StatusCode::BAD_REQUEST,
        EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Engine error rendered in the job envelope.
pub fn engine_error_to_envelope(err: EngineError, job_ref: &str, job_type: &str) -> axum::response::Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(job_id = job_ref, error = %err, "request failed");
    } else {
        tracing::warn!(job_id = job_ref, error = %err, "request rejected");
    }
    (
        status,
        Json(JobEnvelope::failed(job_ref, job_type, status.as_u16(), err.to_string())),
    )
        .into_response()
}

/// Engine error for endpoints that do not use the job envelope.
pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    let status = status_for(&err);
    let code = match &err {
        EngineError::Domain(DomainError::NotFound(_)) => "not_found",
        EngineError::Domain(DomainError::StateConflict(_)) => "state_conflict",
        EngineError::Domain(_) => "validation_error",
        EngineError::Store(_) => "store_error",
    };
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
