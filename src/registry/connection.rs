//! Per-connection state

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A single registered push connection
///
/// Owned exclusively by [`ClientRegistry`](super::ClientRegistry). The sink
/// feeds the long-lived response stream; a write either succeeds or fails
/// immediately against the sink's current state.
#[derive(Debug)]
pub struct ClientConnection {
    /// Process-unique connection id
    pub id: u64,

    /// Write handle to the response stream
    sink: mpsc::UnboundedSender<Bytes>,

    /// Recurring keep-alive task for this connection
    keep_alive: JoinHandle<()>,
}

impl ClientConnection {
    pub(super) fn new(
        id: u64,
        sink: mpsc::UnboundedSender<Bytes>,
        keep_alive: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            sink,
            keep_alive,
        }
    }

    pub(super) fn sink(&self) -> mpsc::UnboundedSender<Bytes> {
        self.sink.clone()
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        // Covers every removal path: failed write, disconnect, shutdown.
        self.keep_alive.abort();
    }
}
