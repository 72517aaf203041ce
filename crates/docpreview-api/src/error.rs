//! HTTP error responses
//!
//! Only request-level problems reach the caller. Job failures happen after
//! the response was sent and go to the failure sink instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::job_queue::QueueError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("We don't accept {0} requests")]
    MethodNotAllowed(String),

    /// Body is not a valid job request; carries the decoder message
    #[error("{0}")]
    Decode(String),

    #[error("Job queue is full, please try again later")]
    QueueFull,

    #[error("Server is shutting down")]
    ShuttingDown,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed(_) | ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::QueueFull | ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full => ApiError::QueueFull,
            QueueError::ShuttingDown => ApiError::ShuttingDown,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Bad request");
        }
        (status, self.to_string()).into_response()
    }
}
