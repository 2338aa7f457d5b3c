use axum::{
    Router,
    routing::{get, post},
};

pub mod callbacks;
pub mod jobs;
pub mod system;

/// Router for all engine endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/feeds/validate", post(jobs::submit))
        .route("/api/jobs", get(jobs::list))
        .route("/api/jobs/:id", get(jobs::status))
        .route("/api/jobs/:id/retry", post(jobs::retry))
        .route("/api/jobs/:id/activities", get(jobs::activities))
        .route("/api/callback/feed", post(callbacks::receive))
}
