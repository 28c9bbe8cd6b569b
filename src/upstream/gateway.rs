//! Upstream gateway: one HTTP/2 connection per forwarded request.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderMap, HeaderValue, Method, Request, StatusCode,
};
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http2::{self, SendRequest};
use hyper_util::rt::{TokioExecutor, TokioIo};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{self, pki_types::ServerName, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use url::Url;

use super::connection::{ConnectionGuard, ConnectionTracker};
use super::passthrough::{PassThrough, StreamOutcome};
use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::security::headers::filter_response_headers;
use crate::translate::UpstreamRequest;

/// Transport-level failures talking to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream configuration: {0}")]
    Config(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TLS server name `{0}`")]
    InvalidServerName(String),

    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP/2 handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("failed to encode upstream request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Send(#[source] hyper::Error),

    #[error("upstream body read failed: {0}")]
    Body(#[source] hyper::Error),
}

/// Status, headers and body of an upstream response.
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Pseudo-headers and hop-by-hop headers already removed.
    pub headers: HeaderMap,
    pub body: PassThrough,
}

/// Resolved upstream base URL plus credential.
#[derive(Debug)]
struct Endpoint {
    tls: bool,
    host: String,
    port: u16,
    base_path: String,
    authorization: HeaderValue,
}

impl Endpoint {
    fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let url = Url::parse(&config.base_url).map_err(|e| {
            UpstreamError::Config(format!("base_url `{}` is not a URL: {e}", config.base_url))
        })?;

        let tls = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(UpstreamError::Config(format!(
                    "unsupported base_url scheme `{other}`"
                )))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| UpstreamError::Config("base_url has no host".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| UpstreamError::Config("base_url has no port".to_string()))?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| {
                UpstreamError::Config("api_key contains characters not allowed in a header".to_string())
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            tls,
            host,
            port,
            base_path: url.path().trim_end_matches('/').to_string(),
            authorization,
        })
    }

    fn socket_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn uri(&self, path_and_query: &str) -> String {
        let (scheme, default_port) = if self.tls { ("https", 443) } else { ("http", 80) };
        let authority = if self.port == default_port {
            self.host.clone()
        } else {
            self.socket_address()
        };
        format!("{scheme}://{authority}{}{path_and_query}", self.base_path)
    }
}

/// Opens a fresh upstream connection for every forwarded request.
#[derive(Clone)]
pub struct UpstreamGateway {
    endpoint: Arc<Endpoint>,
    tls: Option<TlsConnector>,
    tracker: ConnectionTracker,
    response_timeout: Option<Duration>,
    high_water_mark: usize,
}

impl UpstreamGateway {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let endpoint = Endpoint::from_config(config)?;
        let tls = if endpoint.tls {
            Some(tls_connector()?)
        } else {
            None
        };

        Ok(Self {
            endpoint: Arc::new(endpoint),
            tls,
            tracker: ConnectionTracker::new(),
            response_timeout: config.response_timeout(),
            high_water_mark: config.high_water_mark_bytes,
        })
    }

    /// Counters for the connections this gateway opened.
    pub fn connections(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Send `request` upstream with the inbound method and path.
    ///
    /// Resolves as soon as response headers arrive. The connection stays open
    /// while the returned body is being read and is closed when it ends,
    /// fails, or is dropped. On error it is closed before returning. The
    /// optional response timeout runs from the TCP connect to the headers.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, ProxyError> {
        let payload = Bytes::from(serde_json::to_vec(request).map_err(UpstreamError::from)?);
        let accept = if request.is_streaming() {
            "text/event-stream"
        } else {
            "application/json"
        };

        let upstream_request = Request::builder()
            .method(method)
            .uri(self.endpoint.uri(path_and_query))
            .header(AUTHORIZATION, self.endpoint.authorization.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .body(Full::new(payload))
            .map_err(UpstreamError::from)?;

        let uri = upstream_request.uri().clone();
        let exchange = async {
            let (mut sender, guard) = self.connect().await?;
            tracing::debug!(
                connection_id = %guard.id(),
                uri = %uri,
                streaming = request.is_streaming(),
                "Forwarding to upstream"
            );
            sender.ready().await.map_err(UpstreamError::Send)?;
            let response = sender
                .send_request(upstream_request)
                .await
                .map_err(UpstreamError::Send)?;
            Ok::<_, UpstreamError>((sender, guard, response))
        };

        // The limit covers connect, TLS and the handshake as well as the
        // wait for headers. A dropped guard closes its connection.
        let (sender, mut guard, response) = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(limit))??,
            None => exchange.await?,
        };
        let connection_id = guard.id();

        let (parts, body) = response.into_parts();
        tracing::debug!(
            connection_id = %connection_id,
            status = %parts.status,
            "Upstream responded"
        );

        let source = body.into_data_stream().map_err(UpstreamError::Body);
        let body = PassThrough::spawn(source, self.high_water_mark, move |outcome| {
            drop(sender);
            guard.close();
            log_stream_outcome(&guard, outcome);
        });

        Ok(UpstreamResponse {
            status: parts.status,
            headers: filter_response_headers(&parts.headers),
            body,
        })
    }

    async fn connect(&self) -> Result<(SendRequest<Full<Bytes>>, ConnectionGuard), UpstreamError> {
        let addr = self.endpoint.socket_address();
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|source| UpstreamError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let _ = tcp.set_nodelay(true);

        match &self.tls {
            Some(connector) => {
                let host = self.endpoint.host.clone();
                let server_name = ServerName::try_from(host.clone())
                    .map_err(|_| UpstreamError::InvalidServerName(host.clone()))?;
                let stream = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|source| UpstreamError::Tls { host, source })?;
                self.handshake(stream).await
            }
            None => self.handshake(tcp).await,
        }
    }

    async fn handshake<S>(&self, io: S) -> Result<(SendRequest<Full<Bytes>>, ConnectionGuard), UpstreamError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, connection) = http2::handshake(TokioExecutor::new(), TokioIo::new(io))
            .await
            .map_err(UpstreamError::Handshake)?;

        let driver = tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::debug!(error = %error, "Upstream connection ended with error");
            }
        });
        Ok((sender, self.tracker.track(driver)))
    }
}

fn log_stream_outcome(guard: &ConnectionGuard, outcome: StreamOutcome) {
    match outcome {
        StreamOutcome::Completed { bytes } => {
            tracing::debug!(connection_id = %guard.id(), bytes, "Upstream stream completed");
        }
        StreamOutcome::Failed(error) => {
            tracing::warn!(connection_id = %guard.id(), error = %error, "Upstream stream failed");
        }
        StreamOutcome::ConsumerDropped { bytes } => {
            tracing::info!(
                connection_id = %guard.id(),
                bytes,
                "Client disconnected, upstream stream torn down"
            );
        }
    }
}

fn tls_connector() -> Result<TlsConnector, UpstreamError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| UpstreamError::Config(format!("TLS setup failed: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];

    Ok(TlsConnector::from(Arc::new(config)))
}
