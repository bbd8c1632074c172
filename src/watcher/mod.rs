//! Change feed watcher
//!
//! Owns the single feed subscription, the last-seen resume token, and the
//! restart policy. The subscription is consumed as a sequence of
//! [`FeedMessage`]s by one pump task; a terminal error or closure tears the
//! subscription down and schedules exactly one delayed restart, resuming
//! from the recorded token when possible.
//!
//! Subscription lifecycle:
//!
//! ```text
//! Closed ──ensure_running──► Opening ──► Open ──(error|close)──► Closed
//!    ▲                                                             │
//!    └───────────────── restart after fixed delay ◄────────────────┘
//! ```
//!
//! There is no terminal state short of [`FeedWatcher::shutdown`]; the loop
//! is supervised and self-healing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::broadcast::Broadcaster;
use crate::config::RelayConfig;
use crate::error::FeedError;
use crate::feed::{
    ChangeFeedSource, ChangeNotification, FeedFilter, FeedMessage, FeedSubscription,
    RawChangeEvent, ResumeToken,
};
use crate::stats::RelayStats;

/// Open/closed state of the subscription
///
/// Guarded by an async mutex: `ensure_running` holds the lock across the
/// subscribe await, which is what makes concurrent calls idempotent. The
/// first caller opens; later callers wait on the lock and then observe the
/// open subscription. Nothing outside this module ever takes the lock, so
/// a slow subscribe stalls no unrelated work.
#[derive(Debug, Default)]
struct WatcherState {
    /// Pump task for the open subscription; `None` while closed
    subscription: Option<JoinHandle<()>>,

    /// A delayed restart has been scheduled and not yet run
    restart_pending: bool,

    /// Set once by `shutdown`; pending restarts become no-ops
    shutdown: bool,
}

/// Supervised owner of the change feed subscription
pub struct FeedWatcher {
    source: Arc<dyn ChangeFeedSource>,
    broadcaster: Broadcaster,
    filter: FeedFilter,
    restart_delay: Duration,
    max_resume_failures: u32,

    state: tokio::sync::Mutex<WatcherState>,

    /// Position just after the last processed event. Written only by the
    /// pump task, read when (re)subscribing.
    last_resume: std::sync::Mutex<Option<ResumeToken>>,

    /// Consecutive failed opens that carried a resume token
    resume_failures: AtomicU32,

    stats: Arc<RelayStats>,
}

impl FeedWatcher {
    /// Create a watcher; the subscription stays closed until the first
    /// `ensure_running`
    pub fn new(
        source: Arc<dyn ChangeFeedSource>,
        broadcaster: Broadcaster,
        config: &RelayConfig,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            source,
            broadcaster,
            filter: FeedFilter::prefix(config.collection_prefix.clone()),
            restart_delay: config.restart_delay,
            max_resume_failures: config.max_resume_failures,
            state: tokio::sync::Mutex::new(WatcherState::default()),
            last_resume: std::sync::Mutex::new(None),
            resume_failures: AtomicU32::new(0),
            stats,
        }
    }

    /// Open the subscription if it is not already open
    ///
    /// Idempotent under concurrent invocation: callers serialize on the
    /// state lock, so overlapping calls produce exactly one subscribe
    /// attempt. With `resume` set, the open carries the last recorded
    /// resume token when one exists.
    pub async fn ensure_running(self: &Arc<Self>, resume: bool) -> Result<(), FeedError> {
        let mut state = self.state.lock().await;

        if state.shutdown {
            return Err(FeedError::ShutDown);
        }
        if state.subscription.is_some() {
            return Ok(());
        }

        self.open(&mut state, resume).await
    }

    /// Whether a subscription is currently open
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.subscription.is_some()
    }

    /// Last recorded resume token, if any
    pub fn last_resume(&self) -> Option<ResumeToken> {
        self.last_resume.lock().unwrap().clone()
    }

    /// Close the subscription and disable restarts
    ///
    /// Safe to call with no subscription open, and more than once.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.shutdown = true;

        if let Some(pump) = state.subscription.take() {
            pump.abort();
            tracing::info!("Feed watcher shut down");
        }
    }

    async fn open(self: &Arc<Self>, state: &mut WatcherState, resume: bool) -> Result<(), FeedError> {
        let token = if resume { self.last_resume() } else { None };
        let resuming = token.is_some();

        match self.source.subscribe(&self.filter, token).await {
            Ok(subscription) => {
                self.resume_failures.store(0, Ordering::Relaxed);
                state.subscription = Some(self.spawn_pump(subscription));
                tracing::info!(resuming, "Change feed subscription opened");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, resuming, "Change feed subscribe failed");
                if resuming {
                    self.note_resume_failure();
                }
                self.schedule_restart(state);
                Err(e)
            }
        }
    }

    /// After repeated failed opens with a token, fall back to a fresh
    /// subscribe: the token may be past the store's retention window, and
    /// retrying it forever would wedge the watcher.
    fn note_resume_failure(&self) {
        let failures = self.resume_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.max_resume_failures {
            *self.last_resume.lock().unwrap() = None;
            self.resume_failures.store(0, Ordering::Relaxed);
            tracing::warn!(failures, "Discarding resume token; next open starts fresh");
        }
    }

    fn spawn_pump(self: &Arc<Self>, mut subscription: FeedSubscription) -> JoinHandle<()> {
        let watcher = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match subscription.next().await {
                    FeedMessage::Event(event) => watcher.handle_event(event),
                    FeedMessage::Error(e) => {
                        tracing::warn!(error = %e, "Change feed failed");
                        break;
                    }
                    FeedMessage::Closed => {
                        tracing::info!("Change feed closed by the store");
                        break;
                    }
                }
            }

            watcher.on_terminated().await;
        })
    }

    fn handle_event(&self, event: RawChangeEvent) {
        *self.last_resume.lock().unwrap() = Some(event.resume_token.clone());
        self.stats.feed_events.fetch_add(1, Ordering::Relaxed);

        let notification = ChangeNotification::classify(&event, self.filter.prefix_str());
        self.broadcaster.publish(&notification);
    }

    async fn on_terminated(self: Arc<Self>) {
        let mut state = self.state.lock().await;
        state.subscription = None;
        self.schedule_restart(&mut state);
    }

    /// Schedule one delayed `ensure_running(true)`
    ///
    /// Debounced: while a restart is pending, further teardown signals for
    /// the same underlying failure are ignored.
    fn schedule_restart(self: &Arc<Self>, state: &mut WatcherState) {
        if state.shutdown || state.restart_pending {
            return;
        }
        state.restart_pending = true;
        self.stats.feed_restarts.fetch_add(1, Ordering::Relaxed);

        let watcher = Arc::clone(self);
        let delay = self.restart_delay;
        tracing::info!(delay_ms = delay.as_millis() as u64, "Feed restart scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut state = watcher.state.lock().await;
                state.restart_pending = false;
                if state.shutdown {
                    return;
                }
            }

            if let Err(e) = watcher.ensure_running(true).await {
                tracing::warn!(error = %e, "Feed restart attempt failed");
            }
        });
    }
}
