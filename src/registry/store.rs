//! Client registry implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::sse::SseFrame;

use super::connection::ClientConnection;

/// Registry of all open push connections
///
/// The map lock is a plain mutex: every critical section is short and never
/// spans an await or a sink write, so broadcast passes and registrations
/// running on other workers only contend for microseconds.
pub struct ClientRegistry {
    /// Map of connection id to connection
    connections: Mutex<HashMap<u64, ClientConnection>>,

    /// Next connection id to allocate
    next_id: AtomicU64,

    /// Interval between keep-alive frames per connection
    keep_alive_interval: Duration,
}

impl ClientRegistry {
    /// Create a new registry
    pub fn new(keep_alive_interval: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            keep_alive_interval,
        }
    }

    /// Register a connection, returning its id
    ///
    /// Spawns the connection's keep-alive task, which writes a comment
    /// frame at a fixed interval and removes the connection on the first
    /// failed write.
    pub fn register(self: &Arc<Self>, sink: mpsc::UnboundedSender<Bytes>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let keep_alive = self.spawn_keep_alive(id, sink.clone());

        let mut connections = self.connections.lock().unwrap();
        connections.insert(id, ClientConnection::new(id, sink, keep_alive));

        tracing::debug!(client_id = id, clients = connections.len(), "Client registered");
        id
    }

    /// Remove a connection, stopping its keep-alive task
    ///
    /// Idempotent: a failed write and a disconnect signal may both remove
    /// the same id. Returns whether an entry was removed.
    pub fn remove(&self, id: u64) -> bool {
        let removed = self.connections.lock().unwrap().remove(&id);

        match removed {
            // Dropping the connection aborts its keep-alive task.
            Some(_) => {
                tracing::debug!(client_id = id, "Client removed");
                true
            }
            None => false,
        }
    }

    /// Snapshot of current connections for a broadcast pass
    ///
    /// The caller writes to the returned sinks without holding the map
    /// lock, so removal during the pass is safe.
    pub fn snapshot(&self) -> Vec<(u64, mpsc::UnboundedSender<Bytes>)> {
        self.connections
            .lock()
            .unwrap()
            .values()
            .map(|conn| (conn.id, conn.sink()))
            .collect()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a connection id is registered
    pub fn contains(&self, id: u64) -> bool {
        self.connections.lock().unwrap().contains_key(&id)
    }

    /// Remove every connection (process shutdown)
    ///
    /// Dropping the connections aborts all keep-alive tasks and closes the
    /// client streams.
    pub fn clear(&self) {
        let mut connections = self.connections.lock().unwrap();
        let count = connections.len();
        connections.clear();

        if count > 0 {
            tracing::info!(clients = count, "Registry cleared");
        }
    }

    fn spawn_keep_alive(
        self: &Arc<Self>,
        id: u64,
        sink: mpsc::UnboundedSender<Bytes>,
    ) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        let interval = self.keep_alive_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; the connection just sent its
            // initial frame, so skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if sink.send(SseFrame::heartbeat().into_bytes()).is_err() {
                    tracing::debug!(client_id = id, "Keep-alive write failed");
                    if let Some(registry) = registry.upgrade() {
                        registry.remove(id);
                    }
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(interval: Duration) -> Arc<ClientRegistry> {
        Arc::new(ClientRegistry::new(interval))
    }

    #[tokio::test]
    async fn test_register_allocates_monotonic_ids() {
        let registry = registry(Duration::from_secs(25));
        let (tx, _rx) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let a = registry.register(tx);
        let b = registry.register(tx2);

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = registry(Duration::from_secs(25));
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = registry.register(tx);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_tolerates_removal_during_pass() {
        let registry = registry(Duration::from_secs(25));
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let id1 = registry.register(tx1);
        let id2 = registry.register(tx2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);

        // Removal mid-pass: remaining sinks in the snapshot still work.
        registry.remove(id2);
        for (_, sink) in &snapshot {
            let _ = sink.send(Bytes::from_static(b"frame"));
        }

        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"frame"));
        assert!(registry.contains(id1));
        assert!(!registry.contains(id2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_frames_at_interval() {
        let registry = registry(Duration::from_secs(25));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _id = registry.register(tx);

        tokio::time::advance(Duration::from_secs(26)).await;
        assert_eq!(
            rx.recv().await.unwrap(),
            SseFrame::heartbeat().into_bytes()
        );

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(
            rx.recv().await.unwrap(),
            SseFrame::heartbeat().into_bytes()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_stops_keep_alive() {
        let registry = registry(Duration::from_secs(25));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = registry.register(tx);
        registry.remove(id);

        tokio::time::advance(Duration::from_secs(60)).await;
        // The keep-alive task was aborted with the entry; the only way the
        // channel ends is the registry dropping the sender.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_failure_removes_connection() {
        let registry = registry(Duration::from_secs(25));
        let (tx, rx) = mpsc::unbounded_channel();

        let id = registry.register(tx);
        drop(rx);

        tokio::time::advance(Duration::from_secs(26)).await;
        // Let the keep-alive task observe the failed write.
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn test_clear_drains_everything() {
        let registry = registry(Duration::from_secs(25));
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(tx);

        registry.clear();

        assert!(registry.is_empty());
        assert!(rx.recv().await.is_none());
    }
}
