//! Feed source trait and subscription handle

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::FeedError;

use super::event::{RawChangeEvent, ResumeToken};

/// Collection filter applied when subscribing
///
/// The store only yields events for collections whose name starts with the
/// given prefix (case-insensitive). An empty prefix matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    prefix: String,
}

impl FeedFilter {
    /// Create a prefix-match filter (normalized to lower-case)
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_ascii_lowercase(),
        }
    }

    /// The lower-case prefix string
    pub fn prefix_str(&self) -> &str {
        &self.prefix
    }

    /// Whether a collection name passes the filter
    pub fn matches(&self, collection: &str) -> bool {
        collection.to_ascii_lowercase().starts_with(&self.prefix)
    }
}

/// One item on a feed subscription sequence
///
/// `Error` and `Closed` are terminal: nothing follows them, and the
/// consumer is expected to reopen.
#[derive(Debug)]
pub enum FeedMessage {
    /// A change event
    Event(RawChangeEvent),
    /// The feed failed; terminal
    Error(FeedError),
    /// The store closed the feed; terminal
    Closed,
}

/// An open feed subscription
///
/// Wraps the receiving half of the event sequence. Dropping the sending
/// half is equivalent to `Closed`.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: mpsc::UnboundedReceiver<FeedMessage>,
}

impl FeedSubscription {
    /// Build a subscription from a receiver
    pub fn new(rx: mpsc::UnboundedReceiver<FeedMessage>) -> Self {
        Self { rx }
    }

    /// Create a connected sender/subscription pair
    ///
    /// Convenience for sources that push messages from their own task.
    pub fn channel() -> (mpsc::UnboundedSender<FeedMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Receive the next message
    ///
    /// A dropped sender is reported as [`FeedMessage::Closed`].
    pub async fn next(&mut self) -> FeedMessage {
        match self.rx.recv().await {
            Some(message) => message,
            None => FeedMessage::Closed,
        }
    }
}

/// A subscribable change feed, keyed by collection prefix
///
/// Implemented by store adapters; [`MemoryFeed`](super::MemoryFeed) is the
/// in-process implementation used by tests and demos.
#[async_trait]
pub trait ChangeFeedSource: Send + Sync + 'static {
    /// Open a subscription, optionally resuming just after the event
    /// identified by `resume`
    async fn subscribe(
        &self,
        filter: &FeedFilter,
        resume: Option<ResumeToken>,
    ) -> Result<FeedSubscription, FeedError>;
}
