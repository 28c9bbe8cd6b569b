//! Error taxonomy for the request pipeline.
//!
//! Every failure a request can hit ends up as one [`ProxyError`], which the
//! error reporter in [`crate::http::response`] turns into exactly one JSON
//! error response.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Failures surfaced to the downstream caller. None of them are retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Body is not JSON, not an object, or misses a required field.
    #[error("{0}")]
    InvalidRequest(String),

    /// `model` is present but is not the advertised public model.
    #[error("The model `{0}` does not exist or you do not have access to it.")]
    UnsupportedModel(String),

    #[error("Missing or invalid bearer token.")]
    Unauthorized,

    #[error("Request body exceeds the {limit} byte limit.")]
    PayloadTooLarge { limit: usize },

    #[error("No route for {0}.")]
    NotFound(String),

    #[error("Method {0} is not allowed on this route.")]
    MethodNotAllowed(String),

    /// Connection-level failure talking to the upstream.
    #[error("Upstream transport failure: {0}")]
    UpstreamTransport(#[from] UpstreamError),

    #[error("Upstream did not respond within {0:?}.")]
    UpstreamTimeout(Duration),

    /// A buffered upstream body did not parse as JSON.
    #[error("Upstream returned a malformed JSON body: {0}")]
    MalformedUpstreamResponse(#[source] serde_json::Error),
}

impl ProxyError {
    /// Explicit status carried by the error, if any.
    ///
    /// Upstream failures carry none and fall back to 500 when reported.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProxyError::InvalidRequest(_) => Some(StatusCode::BAD_REQUEST),
            ProxyError::UnsupportedModel(_) => Some(StatusCode::NOT_FOUND),
            ProxyError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ProxyError::PayloadTooLarge { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            ProxyError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ProxyError::MethodNotAllowed(_) => Some(StatusCode::METHOD_NOT_ALLOWED),
            ProxyError::UpstreamTimeout(_) => Some(StatusCode::GATEWAY_TIMEOUT),
            ProxyError::UpstreamTransport(_) | ProxyError::MalformedUpstreamResponse(_) => None,
        }
    }
}
