//! OpenAI-compatible chat-completion bridge in front of a DeepSeek-style API.

// Request pipeline
pub mod error;
pub mod http;
pub mod translate;
pub mod upstream;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
