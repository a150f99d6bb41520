//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::dataset::DatasetError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Dataset(e) => match e {
                DatasetError::UnknownResource(_)
                | DatasetError::UnknownRecord { .. }
                | DatasetError::UnknownMethod { .. } => StatusCode::NOT_FOUND,
                DatasetError::UnknownField { .. }
                | DatasetError::UnknownFieldType { .. }
                | DatasetError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
                DatasetError::InvalidFixture(_) | DatasetError::Json(_) | DatasetError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, details) = match &self {
            AppError::Dataset(e) if status.is_server_error() => {
                tracing::error!("Dataset error: {:?}", e);
                ("Internal server error".to_string(), Some(e.to_string()))
            }
            AppError::Dataset(e) => {
                tracing::warn!("Dataset error: {}", e);
                (e.to_string(), None)
            }
            AppError::Unauthorized(reason) => {
                ("Unauthorized".to_string(), Some(reason.to_string()))
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
