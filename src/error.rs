//! Relay error types
//!
//! Error types for the change feed layer. Per-client write failures are not
//! represented here; they are handled locally by pruning the connection and
//! never cross a component boundary.

/// Error type for change feed operations
#[derive(Debug, Clone)]
pub enum FeedError {
    /// Opening the feed subscription failed
    SubscribeFailed(String),
    /// The feed terminated with an error after it was open
    Terminated(String),
    /// The watcher has been shut down and will not reopen
    ShutDown,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::SubscribeFailed(reason) => {
                write!(f, "Feed subscribe failed: {}", reason)
            }
            FeedError::Terminated(reason) => write!(f, "Feed terminated: {}", reason),
            FeedError::ShutDown => write!(f, "Feed watcher is shut down"),
        }
    }
}

impl std::error::Error for FeedError {}
