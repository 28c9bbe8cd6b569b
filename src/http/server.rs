//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the chat, models and preflight handlers
//! - Wire up middleware (request ID, tracing, bearer token, CORS)
//! - Serve plain HTTP (HTTP/1.1 and h2c) and, when configured, TLS
//! - Stop accepting on the shutdown broadcast and drain in-flight requests

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use super::models::list_models;
use super::request::{request_id, UuidRequestId, X_REQUEST_ID};
use super::session::RequestSession;
use crate::config::{ProxyConfig, TlsConfig};
use crate::error::ProxyError;
use crate::net::tls::load_tls_config;
use crate::security::{auth::bearer_auth_middleware, headers::cors_headers};
use crate::upstream::{ConnectionTracker, UpstreamError, UpstreamGateway};

/// Grace period for in-flight TLS connections after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub gateway: UpstreamGateway,
}

/// HTTP front end of the bridge.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    gateway: UpstreamGateway,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let gateway = UpstreamGateway::new(&config.upstream)?;
        let config = Arc::new(config);
        let state = AppState {
            config: Arc::clone(&config),
            gateway: gateway.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            gateway,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(
                "/v1/chat/completions",
                post(chat_completions).options(preflight),
            )
            .route("/chat/completions", post(chat_completions).options(preflight))
            .route("/v1/models", get(list_models).options(preflight))
            .route("/models", get(list_models).options(preflight))
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                bearer_auth_middleware,
            ))
            .with_state(state);

        if config.security.enable_cors {
            for (name, value) in cors_headers() {
                router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
            }
        }

        router
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Upstream connection counters.
    pub fn upstream_connections(&self) -> ConnectionTracker {
        self.gateway.connections().clone()
    }

    /// Serve until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_model = %self.config.models.public_model,
            upstream_model = %self.config.upstream.model,
            "HTTP server starting"
        );

        if let Some(tls) = &self.config.listener.tls {
            self.spawn_tls(tls, shutdown.resubscribe()).await?;
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn spawn_tls(
        &self,
        tls: &TlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr: SocketAddr = tls.bind_address.parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid TLS bind address `{}`", tls.bind_address),
            )
        })?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;

        let handle = Handle::new();
        let server = axum_server::bind_rustls(addr, rustls)
            .handle(handle.clone())
            .serve(self.router.clone().into_make_service());

        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });
        tokio::spawn(async move {
            if let Err(error) = server.await {
                tracing::error!(address = %addr, error = %error, "TLS server failed");
            }
        });

        tracing::info!(address = %addr, "TLS server starting");
        Ok(())
    }
}

/// Chat completion handler: one session per request.
async fn chat_completions(State(state): State<AppState>, request: Request<Body>) -> Response {
    let span = tracing::info_span!(
        "session",
        request_id = %request_id(request.headers()),
        path = %request.uri().path(),
    );
    RequestSession::new(state.config, state.gateway)
        .run(request)
        .instrument(span)
        .await
}

/// CORS preflight. The CORS layers add the headers.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found(uri: Uri) -> ProxyError {
    ProxyError::NotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method) -> ProxyError {
    ProxyError::MethodNotAllowed(method.to_string())
}
