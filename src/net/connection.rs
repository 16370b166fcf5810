//! Per-listener accounting of client connections.
//!
//! The accept loop registers every connection with its [`ConnectionTracker`]
//! and keeps the returned guard alive for as long as the connection is
//! served. Ids are local to a tracker and start at 1.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Sequence number of a client connection on one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Open and total connection counts for one listener.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    accepted: AtomicU64,
    open: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted connection from `peer`.
    pub fn track(&self, peer: SocketAddr) -> ConnectionGuard {
        let id = ConnectionId(self.accepted.fetch_add(1, Ordering::Relaxed) + 1);
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(open);

        ConnectionGuard {
            id,
            peer,
            opened: Instant::now(),
            open: Arc::clone(&self.open),
        }
    }

    /// Connections currently being served.
    pub fn active_count(&self) -> u64 {
        self.open.load(Ordering::SeqCst)
    }

    /// Connections accepted since the tracker was created.
    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

/// Held by the task serving one connection; unregisters it on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    peer: SocketAddr,
    opened: Instant,
    open: Arc<AtomicU64>,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// How long the connection has been open.
    pub fn age(&self) -> Duration {
        self.opened.elapsed()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let open = self.open.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::set_active_connections(open);
        tracing::trace!(
            connection_id = %self.id,
            peer = %self.peer,
            age_ms = self.age().as_millis() as u64,
            "Connection closed"
        );
    }
}
