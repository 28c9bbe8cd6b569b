//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, CORS, bearer token)
//!     → session.rs (one RequestSession per chat completion)
//!         → request.rs (read body under the size limit)
//!         → translate (parse, validate, rewrite for upstream)
//!         → upstream gateway (fresh HTTP/2 connection)
//!         → relay.rs (stream verbatim, or buffer and rewrite `model`)
//!     → response.rs (any failure → one JSON error body)
//!     → Send to client
//! ```

pub mod models;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;
pub mod session;

pub use relay::DeliveryMode;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use session::{RequestSession, SessionState};
