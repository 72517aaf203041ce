//! Conversion request handler

use axum::{body::Bytes, extract::State, http::Method};
use docpreview_core::JobRequest;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Accept a conversion request and queue it
///
/// Answers "OK" as soon as the job is admitted; the outcome is only ever
/// reported through the callback.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed(method.to_string()));
    }

    let request: JobRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

    tracing::info!(
        bucket = %request.bucket,
        key = %request.key,
        callback_url = %request.callback_url,
        "Conversion request accepted"
    );

    state.job_queue.submit(request)?;

    Ok("OK")
}
