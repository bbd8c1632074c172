//! Notification fan-out
//!
//! The broadcaster holds no state of its own: it encodes a notification
//! exactly once and walks a snapshot of the registry, writing the shared
//! `Bytes` frame to each sink. A failed write prunes that one connection
//! and never interrupts delivery to the rest; nothing here can surface an
//! error to the feed layer.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::feed::ChangeNotification;
use crate::registry::ClientRegistry;
use crate::stats::RelayStats;

/// Fan-out of change notifications to every registered connection
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    stats: Arc<RelayStats>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry
    pub fn new(registry: Arc<ClientRegistry>, stats: Arc<RelayStats>) -> Self {
        Self { registry, stats }
    }

    /// Serialize once and deliver to every connection
    ///
    /// Returns the number of connections that accepted the frame. Failed
    /// sinks are removed from the registry; each remaining connection still
    /// receives the frame (per-iteration failure capture, not one guard
    /// around the whole pass).
    pub fn publish(&self, notification: &ChangeNotification) -> usize {
        let frame = notification.to_frame().into_bytes();
        let mut delivered = 0;

        for (id, sink) in self.registry.snapshot() {
            if sink.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(client_id = id, "Pruning client after failed write");
                self.registry.remove(id);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.stats
            .notifications_published
            .fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            collection = %notification.collection,
            operation = %notification.operation,
            delivered,
            "Notification broadcast"
        );

        delivered
    }
}
