//! Upstream gateway subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamRequest
//!     → gateway.rs (TCP [+ TLS] → HTTP/2 handshake, one connection per request)
//!     → send request, await response headers
//!     → passthrough.rs (pump body through a bounded buffer)
//!     → connection.rs (guard closes the connection exactly once)
//! ```
//!
//! # Design Decisions
//! - No pooling: each exchange owns its connection end to end
//! - Status and headers resolve before the body is read
//! - No retries, no backoff

pub mod connection;
pub mod gateway;
pub mod passthrough;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use gateway::{UpstreamError, UpstreamGateway, UpstreamResponse};
pub use passthrough::{PassThrough, StreamOutcome, DEFAULT_HIGH_WATER_MARK};
