//! Client-side frame stream
//!
//! The stream handed to the HTTP layer. It yields frames already encoded
//! for `text/event-stream` and carries a guard that unregisters the
//! connection when the response body is dropped, which is how the
//! transport's close signal reaches the registry.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::registry::ClientRegistry;

/// Unregisters a connection when dropped
#[derive(Debug)]
pub(super) struct DisconnectGuard {
    registry: Weak<ClientRegistry>,
    id: u64,
}

impl DisconnectGuard {
    pub(super) fn new(registry: Weak<ClientRegistry>, id: u64) -> Self {
        Self { registry, id }
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // remove() is idempotent; a failed write may have beaten us.
            registry.remove(self.id);
        }
    }
}

/// Stream of encoded frames for one client connection
///
/// Ends only when the relay shuts down or the connection is pruned after a
/// failed write.
#[derive(Debug)]
pub struct ClientStream {
    rx: mpsc::UnboundedReceiver<Bytes>,
    _guard: DisconnectGuard,
}

impl ClientStream {
    pub(super) fn new(rx: mpsc::UnboundedReceiver<Bytes>, guard: DisconnectGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Receive the next frame; `None` means the connection is finished
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Stream for ClientStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}
