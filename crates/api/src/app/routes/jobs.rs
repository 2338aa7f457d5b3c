use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use feedrun_core::JobType;
use feedrun_infra::jobs::ValidationRequest;

use crate::app::dto::{self, JobEnvelope};
use crate::app::errors;
use crate::app::services::AppServices;

pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ValidationRequest>,
) -> axum::response::Response {
    let job_ref = body.job_id.clone().unwrap_or_default();
    let job_type = body.job_type.unwrap_or(JobType::FeedValidation);

    match services.blocking(move |s| s.jobs.submit(body)).await {
        Ok(accepted) => {
            let code = if accepted.retried { StatusCode::OK } else { StatusCode::ACCEPTED };
            let envelope = JobEnvelope::for_job(accepted.job_ref, &accepted.job, code.as_u16());
            (code, Json(envelope)).into_response()
        }
        Err(e) => errors::engine_error_to_envelope(e, &job_ref, job_type.as_str()),
    }
}

pub async fn retry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<dto::RetryRequest>>,
) -> axum::response::Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let job_ref = id.clone();
    let retried = services
        .blocking(move |s| s.jobs.retry(&job_ref, body.requested_by.as_deref()))
        .await;
    match retried {
        Ok(accepted) => {
            let envelope = JobEnvelope::for_job(accepted.job_ref, &accepted.job, StatusCode::OK.as_u16());
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Err(e) => {
            let job_ref = id.clone();
            let job_type = services
                .blocking(move |s| s.jobs.status(&job_ref))
                .await
                .map(|job| job.job_type.to_string())
                .unwrap_or_default();
            errors::engine_error_to_envelope(e, &id, &job_type)
        }
    }
}

pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let job_ref = id.clone();
    let found = services
        .blocking(move |s| s.jobs.status(&job_ref).map(|job| (s.jobs.job_ref(&job), job)))
        .await;
    match found {
        Ok((job_ref, job)) => {
            let envelope = JobEnvelope::for_job(job_ref, &job, StatusCode::OK.as_u16());
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Err(e) => errors::engine_error_to_envelope(e, &id, ""),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListJobsQuery>,
) -> axum::response::Response {
    let listed = services
        .blocking(move |s| s.jobs.list_jobs(query.merchant_id.as_deref()))
        .await;
    match listed {
        Ok(jobs) => Json(dto::JobList {
            count: jobs.len(),
            jobs,
        })
        .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn activities(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let job_ref = id.clone();
    match services.blocking(move |s| s.jobs.activities(&job_ref)).await {
        Ok(activities) => Json(dto::ActivityList {
            job_id: id,
            activities,
        })
        .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
