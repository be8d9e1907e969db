//! Connection identity and in-flight accounting.
//!
//! # Responsibilities
//! - Number connections so their log lines can be correlated
//! - Count connections currently being served
//! - Release the count on every exit path, panics included

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection number, shown as `conn-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        // Uniqueness only; no ordering with other memory.
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Steps a connection goes through, as reported in trace events.
///
/// ```text
/// AwaitRequestLine → {Timeout, Reset, Parsed}
/// Parsed → {StaticRoute, DynamicRoute} → ResponseWritten → Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitRequestLine,
    Timeout,
    Reset,
    Parsed,
    StaticRoute,
    DynamicRoute,
    ResponseWritten,
    Closed,
}

/// Shared counter of connections being served.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    in_flight: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new connection until the returned guard drops.
    pub fn track(&self) -> ConnectionGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened();
        ConnectionGuard {
            in_flight: Arc::clone(&self.in_flight),
            id: ConnectionId::next(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ConnectionGuard {
    in_flight: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed();
    }
}
