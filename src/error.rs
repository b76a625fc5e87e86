//! Error taxonomy surfaced to API callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::types::ErrorBody;

/// Errors a request can end with.
///
/// Resolution failures map to 404 so callers cannot distinguish a missing
/// bundle from a broken one; the distinction is logged server-side. Anything
/// that fails after resolution is an execution failure and maps to 500 with
/// its message in the `detail` field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not found")]
    ModelNotFound,
    #[error("{0}")]
    Execution(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelNotFound => StatusCode::NOT_FOUND,
            ApiError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Execution(err.to_string())
    }
}
