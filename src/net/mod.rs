//! Network layer subsystem.
//!
//! The plain listener is a bare `TcpListener` handed to the HTTP server; the
//! optional TLS listener is configured here.

pub mod tls;
