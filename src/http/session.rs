//! Per-request orchestration.
//!
//! ```text
//! Received → Parsing → Validating → Translating → UpstreamCalling → Relaying → Completed
//!     └──────────┴──────────┴────────────┴──────────────┴─────────────┴──→ Failed
//! ```
//!
//! A session owns everything scoped to one request. Every failure leaves
//! through [`report`](crate::http::response::report) exactly once, and the
//! model check runs before any upstream connection is opened.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};

use super::relay::{relay, DeliveryMode};
use super::request::IncomingRequest;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::translate::{build_upstream_request, decode_chat_request, parse_body, validate_model};
use crate::upstream::UpstreamGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Received,
    Parsing,
    Validating,
    Translating,
    UpstreamCalling,
    Relaying,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One chat-completion exchange.
pub struct RequestSession {
    config: Arc<ProxyConfig>,
    gateway: UpstreamGateway,
    state: SessionState,
    mode: Option<DeliveryMode>,
    started: Instant,
}

impl RequestSession {
    pub fn new(config: Arc<ProxyConfig>, gateway: UpstreamGateway) -> Self {
        Self {
            config,
            gateway,
            state: SessionState::Received,
            mode: None,
            started: Instant::now(),
        }
    }

    /// Drive the request to a response. Never fails: errors become error
    /// responses.
    ///
    /// For streaming responses `Completed` means the body was handed to the
    /// client connection; the gateway logs how the stream itself ended.
    pub async fn run(mut self, request: Request<Body>) -> Response {
        let response = match self.execute(request).await {
            Ok(response) => {
                self.advance(SessionState::Completed);
                response
            }
            Err(error) => {
                self.advance(SessionState::Failed);
                error.into_response()
            }
        };

        let mode = self.mode.map_or("none", |m| m.as_str());
        metrics::record_request(mode, response.status().as_u16(), self.started);
        tracing::info!(
            status = response.status().as_u16(),
            mode,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Request finished"
        );
        response
    }

    async fn execute(&mut self, request: Request<Body>) -> Result<Response, ProxyError> {
        self.advance(SessionState::Parsing);
        let incoming = IncomingRequest::read(request, self.config.security.max_body_size).await?;
        let body = parse_body(&incoming.body)?;

        self.advance(SessionState::Validating);
        validate_model(body.get("model"), &self.config.models.public_model)?;
        let chat = decode_chat_request(body)?;

        self.advance(SessionState::Translating);
        let upstream_request = build_upstream_request(chat, &self.config.upstream.model);
        let mode = DeliveryMode::from_stream_flag(upstream_request.is_streaming());
        self.mode = Some(mode);

        self.advance(SessionState::UpstreamCalling);
        let upstream = self
            .gateway
            .forward(incoming.method, &incoming.path, &upstream_request)
            .await?;

        self.advance(SessionState::Relaying);
        relay(upstream, mode, &self.config.models.public_model).await
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(!self.state.is_terminal(), "session already {}", self.state);
        tracing::trace!(from = %self.state, to = %next, "Session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn session() -> RequestSession {
        let mut config = ProxyConfig::default();
        // Nothing listens here; reaching the upstream would fail the test.
        config.upstream.base_url = "http://127.0.0.1:9".to_string();
        config.upstream.api_key = "sk-test".to_string();
        let gateway = UpstreamGateway::new(&config.upstream).unwrap();
        RequestSession::new(Arc::new(config), gateway)
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/chat/completions")
            .body(Body::from(body))
            .unwrap()
    }

    async fn error_code(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice::<Value>(&bytes).unwrap()["error"]["code"].clone()
    }

    #[tokio::test]
    async fn unsupported_model_never_reaches_upstream() {
        let session = session();
        let gateway = session.gateway.clone();

        let response = session
            .run(post(r#"{"model":"gpt-3.5-turbo","messages":[]}"#))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(response).await, json!(404));
        assert_eq!(gateway.connections().opened_total(), 0);
    }

    #[tokio::test]
    async fn missing_model_is_invalid() {
        let session = session();
        let gateway = session.gateway.clone();

        let response = session.run(post(r#"{"messages":[]}"#)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(gateway.connections().opened_total(), 0);
    }

    #[tokio::test]
    async fn non_json_body_is_invalid() {
        let response = session().run(post("not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, json!(400));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_500() {
        let response = session()
            .run(post(r#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_code(response).await, json!(500));
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Relaying.is_terminal());
    }
}
