//! Relay configuration

use std::time::Duration;

/// Relay configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Collection-name prefix used to filter the feed subscription and
    /// stripped from outward-facing collection names (stored lower-case)
    pub collection_prefix: String,

    /// Interval between keep-alive comment frames on each connection
    pub keep_alive_interval: Duration,

    /// Delay before reopening the feed after an error or closure
    pub restart_delay: Duration,

    /// Consecutive failed resume attempts before the resume token is
    /// discarded and the next open starts fresh
    pub max_resume_failures: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            collection_prefix: String::new(),
            keep_alive_interval: Duration::from_secs(25),
            restart_delay: Duration::from_secs(3),
            max_resume_failures: 3,
        }
    }
}

impl RelayConfig {
    /// Create a new config with the given collection prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::default().collection_prefix(prefix)
    }

    /// Set the collection prefix (normalized to lower-case)
    pub fn collection_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.collection_prefix = prefix.into().to_ascii_lowercase();
        self
    }

    /// Set the keep-alive interval
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Set the feed restart delay
    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Set the resume failure threshold
    pub fn max_resume_failures(mut self, max: u32) -> Self {
        self.max_resume_failures = max;
        self
    }
}
