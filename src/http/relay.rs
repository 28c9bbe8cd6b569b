//! Response relay: upstream response → client response.
//!
//! # Responsibilities
//! - Copy upstream status and filtered headers before any body bytes
//! - Streaming: forward upstream bytes verbatim as they arrive
//! - Buffered: collect, rewrite `model`, emit one JSON body
//!
//! # Design Decisions
//! - Event-stream frames are never reparsed
//! - Dropping the client body drops the pass-through, which tears the
//!   upstream stream down
//! - A buffered failure is returned as an error, never as a half-written body

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue,
    },
    response::Response,
};

use crate::error::ProxyError;
use crate::translate::rewrite_response_model;
use crate::upstream::UpstreamResponse;

/// How the response body reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Live event stream, byte for byte.
    Streaming,
    /// One JSON object after the upstream body completes.
    Buffered,
}

impl DeliveryMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            DeliveryMode::Streaming
        } else {
            DeliveryMode::Buffered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Streaming => "streaming",
            DeliveryMode::Buffered => "buffered",
        }
    }
}

/// Turn an upstream response into the client response.
pub async fn relay(
    upstream: UpstreamResponse,
    mode: DeliveryMode,
    public_model: &str,
) -> Result<Response, ProxyError> {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = upstream;

    let body = match mode {
        DeliveryMode::Streaming => Body::from_stream(body),
        DeliveryMode::Buffered => {
            let raw = body.collect().await?;
            Body::from(rewrite_response_model(&raw, public_model)?)
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    if mode == DeliveryMode::Buffered {
        let headers = response.headers_mut();
        headers.remove(CONTENT_LENGTH);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{PassThrough, UpstreamError, DEFAULT_HIGH_WATER_MARK};
    use axum::body::to_bytes;
    use axum::http::{HeaderMap, StatusCode};
    use bytes::Bytes;
    use futures_util::stream;
    use serde_json::{json, Value};

    fn upstream(parts: Vec<Result<Bytes, UpstreamError>>, content_type: &'static str) -> UpstreamResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.insert("x-ds-trace", HeaderValue::from_static("abc"));
        UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: PassThrough::spawn(stream::iter(parts), DEFAULT_HIGH_WATER_MARK, |_| {}),
        }
    }

    #[tokio::test]
    async fn buffered_body_gets_public_model() {
        let body = json!({"id": "x", "model": "deepseek-chat", "choices": []}).to_string();
        let half = body.len() / 2;
        let parts = vec![
            Ok(Bytes::copy_from_slice(&body.as_bytes()[..half])),
            Ok(Bytes::copy_from_slice(&body.as_bytes()[half..])),
        ];

        let response = relay(upstream(parts, "application/json; charset=utf-8"), DeliveryMode::Buffered, "gpt-4o")
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-ds-trace"], "abc");
        assert!(response.headers().get(CONTENT_LENGTH).is_none());

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"id": "x", "model": "gpt-4o", "choices": []}));
    }

    #[tokio::test]
    async fn buffered_garbage_is_malformed() {
        let parts = vec![Ok(Bytes::from_static(b"<html>bad gateway</html>"))];
        let result = relay(upstream(parts, "text/html"), DeliveryMode::Buffered, "gpt-4o").await;
        assert!(matches!(result, Err(ProxyError::MalformedUpstreamResponse(_))));
    }

    #[tokio::test]
    async fn buffered_transport_failure_is_reported() {
        let parts = vec![
            Ok(Bytes::from_static(b"{\"id\":")),
            Err(UpstreamError::Config("reset".into())),
        ];
        let result = relay(upstream(parts, "application/json"), DeliveryMode::Buffered, "gpt-4o").await;
        assert!(matches!(result, Err(ProxyError::UpstreamTransport(_))));
    }

    #[tokio::test]
    async fn streaming_body_is_verbatim() {
        let frames = "data: {\"model\":\"deepseek-chat\"}\n\ndata: [DONE]\n\n";
        let parts = vec![
            Ok(Bytes::from_static(b"data: {\"model\":\"deepseek-chat\"}\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        ];

        let response = relay(upstream(parts, "text/event-stream"), DeliveryMode::Streaming, "gpt-4o")
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, frames);
    }

    #[tokio::test]
    async fn streaming_error_terminates_body() {
        let parts = vec![
            Ok(Bytes::from_static(b"data: {}\n\n")),
            Err(UpstreamError::Config("reset".into())),
        ];

        let response = relay(upstream(parts, "text/event-stream"), DeliveryMode::Streaming, "gpt-4o")
            .await
            .unwrap();

        assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[test]
    fn delivery_mode_labels() {
        assert_eq!(DeliveryMode::from_stream_flag(true).as_str(), "streaming");
        assert_eq!(DeliveryMode::from_stream_flag(false).as_str(), "buffered");
    }
}
