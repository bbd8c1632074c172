//! Self-healing change-feed to server-sent-events relay
//!
//! `relay-rs` subscribes once to a change feed on an external record store
//! and fans every change event out to any number of long-lived SSE client
//! connections, recovering from feed interruptions via a resume checkpoint.
//!
//! # Architecture
//!
//! ```text
//!   record store ──change feed──► FeedWatcher ──► Broadcaster
//!                    (resume)         │               │ snapshot
//!                                     │               ▼
//!                                     │         ClientRegistry
//!                                     │          │    │    │
//!        RelayService ──register──────┘          ▼    ▼    ▼
//!        (GET /events)                         [SSE] [SSE] [SSE]
//! ```
//!
//! - [`registry::ClientRegistry`] owns every open connection and its
//!   keep-alive task.
//! - [`broadcast::Broadcaster`] encodes each notification once and writes
//!   it to every connection, pruning the ones whose write fails.
//! - [`watcher::FeedWatcher`] owns the single feed subscription, the
//!   resume token, and the restart policy.
//! - [`service::RelayService`] registers viewers, lazily starts the
//!   watcher exactly once, and exposes the axum subscribe endpoint.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relay_rs::feed::{ChangeFeedSource, MemoryFeed};
//! use relay_rs::{RelayConfig, RelayService};
//!
//! # async fn run() {
//! let feed = Arc::new(MemoryFeed::new());
//! let config = RelayConfig::with_prefix("acme_");
//! let service = Arc::new(RelayService::new(config, feed as Arc<dyn ChangeFeedSource>));
//!
//! let app = relay_rs::service::router(service);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```
//!
//! Delivery is at-most-once and best-effort: a client that loses its
//! transport simply reconnects and gets a fresh connection id; there is no
//! per-client replay of missed events.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod feed;
pub mod registry;
pub mod service;
pub mod sse;
pub mod stats;
pub mod watcher;

pub use broadcast::Broadcaster;
pub use config::RelayConfig;
pub use error::FeedError;
pub use registry::ClientRegistry;
pub use service::RelayService;
pub use sse::SseFrame;
pub use stats::{RelayStats, StatsSnapshot};
pub use watcher::FeedWatcher;
