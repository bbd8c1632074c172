//! Relay-wide counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated across the relay
///
/// All counters are monotonic; `clients_active` is derived from the
/// registry, not tracked here.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Total connections ever registered
    pub connections_total: AtomicU64,
    /// Feed events consumed
    pub feed_events: AtomicU64,
    /// Notifications broadcast, whatever the audience size
    pub notifications_published: AtomicU64,
    /// Frames dropped on a failed per-client write
    pub frames_dropped: AtomicU64,
    /// Feed restarts scheduled
    pub feed_restarts: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            feed_events: self.feed_events.load(Ordering::Relaxed),
            notifications_published: self.notifications_published.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            feed_restarts: self.feed_restarts.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`RelayStats`] counter values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connections_total: u64,
    pub feed_events: u64,
    pub notifications_published: u64,
    pub frames_dropped: u64,
    pub feed_restarts: u64,
}
