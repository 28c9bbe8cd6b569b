//! Request identification and inbound request capture.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Read the inbound body under the configured size limit
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read once, into memory, before any translation starts

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request},
};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::ProxyError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Issues UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID carried by `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// What the pipeline needs from an inbound request.
#[derive(Debug)]
pub struct IncomingRequest {
    pub method: Method,
    /// Path plus query string, forwarded upstream as is.
    pub path: String,
    pub body: Bytes,
}

impl IncomingRequest {
    /// Read the full body, failing once it exceeds `limit` bytes.
    pub async fn read(request: Request<Body>, limit: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let body = to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.is::<LengthLimitError>() {
                ProxyError::PayloadTooLarge { limit }
            } else {
                ProxyError::InvalidRequest(format!("Failed to read request body: {inner}"))
            }
        })?;

        Ok(Self {
            method: parts.method,
            path,
            body,
        })
    }
}
