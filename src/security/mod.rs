//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (optional static bearer token)
//!     → Pass to handlers
//!
//! Upstream response:
//!     → headers.rs (strip pseudo / hop-by-hop headers)
//!     → headers.rs (static CORS headers on the way out)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a configured token is required on every non-preflight request
//! - No trust in upstream connection headers

pub mod auth;
pub mod headers;
