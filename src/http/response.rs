//! Error reporting.
//!
//! # Responsibilities
//! - Turn every pipeline failure into one terminated JSON response
//! - Pick the status from the error, defaulting to 500
//! - Log the failure for operators
//!
//! # Design Decisions
//! - Body shape is always `{"error": {"code": <int>, "message": <string>}}`
//! - 4xx are logged at warn, everything else at error

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ProxyError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: u16,
    message: String,
}

/// Build the error response for `error`.
pub fn report(error: &ProxyError) -> Response {
    let status = error.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = error.to_string();

    if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
    } else {
        tracing::error!(status = status.as_u16(), error = %message, "Request failed");
    }

    let body = ErrorBody {
        error: ErrorDetail {
            code: status.as_u16(),
            message,
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        report(&self)
    }
}
