//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::upstream::DEFAULT_HIGH_WATER_MARK;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_UPSTREAM_MODEL: &str = "deepseek-chat";
pub const DEFAULT_PUBLIC_MODEL: &str = "gpt-4o";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Front-end listeners.
    pub listener: ListenerConfig,

    /// Upstream endpoint, credential and model.
    pub upstream: UpstreamConfig,

    /// Publicly advertised model.
    pub models: ModelConfig,

    /// Inbound token, CORS and body limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plain HTTP bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS front end (HTTP/2 with HTTP/1.1 fallback).
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS front end.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Bind address for the TLS listener.
    #[serde(default = "default_tls_bind_address")]
    pub bind_address: String,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

fn default_tls_bind_address() -> String {
    "0.0.0.0:8443".to_string()
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; the inbound path is appended to it.
    pub base_url: String,

    /// Bearer credential. `DEEPSEEK_API_KEY` overrides this value.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model id every upstream request is sent with.
    pub model: String,

    /// Bound on the wait for upstream response headers. Unbounded when unset.
    pub response_timeout_secs: Option<u64>,

    /// Most unconsumed upstream bytes held in memory while streaming.
    pub high_water_mark_bytes: usize,
}

impl UpstreamConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_UPSTREAM_MODEL.to_string(),
            response_timeout_secs: None,
            high_water_mark_bytes: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// The only model id clients may request.
    pub public_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            public_model: DEFAULT_PUBLIC_MODEL.to_string(),
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Static bearer token required from clients, if set.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Add static CORS headers to every response.
    pub enable_cors: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            enable_cors: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
