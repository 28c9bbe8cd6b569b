//! Upstream connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count opened, active and closed upstream connections
//! - Close each connection exactly once, whichever exit path gets there first

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an upstream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Counts {
    opened: AtomicU64,
    closed: AtomicU64,
}

/// Tracks upstream connections opened by the gateway.
///
/// Cloning shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counts: Arc<Counts>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly established connection whose I/O is driven by `driver`.
    /// Returns the guard that owns it.
    pub fn track(&self, driver: JoinHandle<()>) -> ConnectionGuard {
        self.counts.opened.fetch_add(1, Ordering::SeqCst);
        metrics::upstream_connection_opened();

        let id = ConnectionId::next();
        tracing::trace!(connection_id = %id, "Upstream connection opened");
        ConnectionGuard {
            counts: Arc::clone(&self.counts),
            driver: Some(driver),
            id,
        }
    }

    /// Total connections ever opened.
    pub fn opened_total(&self) -> u64 {
        self.counts.opened.load(Ordering::SeqCst)
    }

    /// Total connections closed.
    pub fn closed_total(&self) -> u64 {
        self.counts.closed.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn active_count(&self) -> u64 {
        self.opened_total() - self.closed_total()
    }
}

/// Owns one upstream connection. Closing aborts the task driving the
/// connection, which drops the socket.
///
/// `close` is idempotent and also runs on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    counts: Arc<Counts>,
    driver: Option<JoinHandle<()>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.driver.is_none()
    }

    /// Close the connection. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
            self.counts.closed.fetch_add(1, Ordering::SeqCst);
            metrics::upstream_connection_closed();
            tracing::trace!(connection_id = %self.id, "Upstream connection closed");
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.close();
    }
}
