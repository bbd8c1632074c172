//! Relay service
//!
//! The externally facing entry point. Wires the registry, broadcaster, and
//! watcher together: registering a viewer lazily starts the feed watcher
//! (exactly once, however many viewers arrive at the same moment), and a
//! viewer's disconnect unregisters it.

pub mod http;
pub mod stream;

pub use http::router;
pub use stream::ClientStream;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::broadcast::Broadcaster;
use crate::config::RelayConfig;
use crate::feed::ChangeFeedSource;
use crate::registry::ClientRegistry;
use crate::sse::SseFrame;
use crate::stats::{RelayStats, StatsSnapshot};
use crate::watcher::FeedWatcher;

use self::stream::DisconnectGuard;

/// Live-update relay over a change feed source
pub struct RelayService {
    registry: Arc<ClientRegistry>,
    watcher: Arc<FeedWatcher>,
    stats: Arc<RelayStats>,
}

impl RelayService {
    /// Create a relay over a feed source
    ///
    /// The feed subscription is not opened here; it opens lazily when the
    /// first client subscribes.
    pub fn new(config: RelayConfig, source: Arc<dyn ChangeFeedSource>) -> Self {
        let registry = Arc::new(ClientRegistry::new(config.keep_alive_interval));
        let stats = Arc::new(RelayStats::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&stats));
        let watcher = Arc::new(FeedWatcher::new(source, broadcaster, &config, Arc::clone(&stats)));

        Self {
            registry,
            watcher,
            stats,
        }
    }

    /// Register a new viewer connection
    ///
    /// Writes the initial `event: connected` frame, makes sure the watcher
    /// is running (a no-op when it already is), and returns the connection
    /// id with the frame stream. Dropping the stream unregisters the
    /// connection.
    pub async fn subscribe(&self) -> (u64, ClientStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.registry.register(tx.clone());
        self.stats.connections_total.fetch_add(1, Ordering::Relaxed);

        let connected = serde_json::json!({ "clientId": id }).to_string();
        // The receiver is held right here; the send cannot fail.
        let _ = tx.send(SseFrame::event("connected", &connected).into_bytes());

        // Feed trouble is retried internally and never surfaces to clients.
        if let Err(e) = self.watcher.ensure_running(false).await {
            tracing::warn!(error = %e, "Feed watcher not running after registration");
        }

        let guard = DisconnectGuard::new(Arc::downgrade(&self.registry), id);
        (id, ClientStream::new(rx, guard))
    }

    /// The connection registry
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// The feed watcher
    pub fn watcher(&self) -> &Arc<FeedWatcher> {
        &self.watcher
    }

    /// Current counter values
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shut down: close the feed and drop every client connection
    pub async fn shutdown(&self) {
        self.watcher.shutdown().await;
        self.registry.clear();
    }
}
