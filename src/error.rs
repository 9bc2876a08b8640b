use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::generation::GenerationError;
use crate::store::StoreError;

/// Service-level error taxonomy. Nothing in here is retried; a failed
/// request is a failed request.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full detail goes to the log; clients get a generic message so raw
        // upstream error text never leaks into a response field.
        let (status, message) = match &self {
            AppError::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            AppError::Generation(e) => {
                tracing::error!(error = %e, "recipe generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate recipes. Please try again later.".to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "record store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to retrieve recipes".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
