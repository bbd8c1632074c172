//! In-process change feed
//!
//! A scriptable [`ChangeFeedSource`] backed by a channel, used by the
//! integration tests and the demo server. Events are injected with
//! [`MemoryFeed::emit`]; failures and store-side closure are injected with
//! [`MemoryFeed::fail`] and [`MemoryFeed::close`]. Every subscribe attempt
//! and the resume token it carried are recorded for inspection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::FeedError;

use super::event::{Operation, RawChangeEvent, ResumeToken};
use super::source::{ChangeFeedSource, FeedFilter, FeedMessage, FeedSubscription};

struct ActiveSubscription {
    tx: mpsc::UnboundedSender<FeedMessage>,
    filter: FeedFilter,
}

#[derive(Default)]
struct Inner {
    /// At most one subscription is open at a time; a new subscribe replaces
    /// the previous one (the old receiver then observes `Closed`).
    active: Option<ActiveSubscription>,

    /// Resume token carried by each subscribe attempt, in order
    resume_history: Vec<Option<ResumeToken>>,

    /// Number of upcoming subscribe attempts to reject
    fail_remaining: u32,
}

/// In-memory [`ChangeFeedSource`]
pub struct MemoryFeed {
    inner: Mutex<Inner>,
    next_position: AtomicU64,
}

impl MemoryFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_position: AtomicU64::new(1),
        }
    }

    /// Inject a change event
    ///
    /// The event is delivered to the open subscription if its filter
    /// matches; with no subscription open it is dropped. Returns the
    /// generated resume token either way.
    pub fn emit(&self, operation: Operation, collection: &str) -> ResumeToken {
        let position = self.next_position.fetch_add(1, Ordering::Relaxed);
        let token = ResumeToken::new(Bytes::copy_from_slice(&position.to_be_bytes()));

        let inner = self.inner.lock().unwrap();
        if let Some(active) = &inner.active {
            if active.filter.matches(collection) {
                let event = RawChangeEvent::new(operation, collection, token.clone());
                let _ = active.tx.send(FeedMessage::Event(event));
            }
        }

        token
    }

    /// Fail the open subscription with a terminal error
    pub fn fail(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(active) = inner.active.take() {
            let _ = active
                .tx
                .send(FeedMessage::Error(FeedError::Terminated(reason.into())));
        }
    }

    /// Close the open subscription from the store side
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(active) = inner.active.take() {
            let _ = active.tx.send(FeedMessage::Closed);
        }
    }

    /// Reject the next `n` subscribe attempts
    pub fn fail_next_subscribes(&self, n: u32) {
        self.inner.lock().unwrap().fail_remaining = n;
    }

    /// Whether a subscription is currently open
    pub fn has_subscriber(&self) -> bool {
        self.inner.lock().unwrap().active.is_some()
    }

    /// Total subscribe attempts seen, including rejected ones
    pub fn subscribe_attempts(&self) -> usize {
        self.inner.lock().unwrap().resume_history.len()
    }

    /// Resume token carried by each subscribe attempt, in order
    pub fn resume_history(&self) -> Vec<Option<ResumeToken>> {
        self.inner.lock().unwrap().resume_history.clone()
    }
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeedSource for MemoryFeed {
    async fn subscribe(
        &self,
        filter: &FeedFilter,
        resume: Option<ResumeToken>,
    ) -> Result<FeedSubscription, FeedError> {
        let mut inner = self.inner.lock().unwrap();
        inner.resume_history.push(resume);

        if inner.fail_remaining > 0 {
            inner.fail_remaining -= 1;
            return Err(FeedError::SubscribeFailed("injected failure".into()));
        }

        let (tx, subscription) = FeedSubscription::channel();
        inner.active = Some(ActiveSubscription {
            tx,
            filter: filter.clone(),
        });

        Ok(subscription)
    }
}
