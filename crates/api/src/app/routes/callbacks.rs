use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::Value;

use crate::app::errors;
use crate::app::services::AppServices;

/// Requester recorded on activities created by inbound callbacks.
const CALLBACK_REQUESTER: &str = "callback";

pub async fn receive(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    tracing::info!(payload = %body, "received callback");
    let received = services
        .blocking(move |s| s.reconciler.receive(&body, CALLBACK_REQUESTER))
        .await;
    match received {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
