//! Change feed abstraction
//!
//! The record store is an external collaborator; this module defines the
//! only surface the relay sees of it: a subscribable, resumable sequence of
//! change events filtered by collection-name prefix.
//!
//! ```text
//!   store ──subscribe(filter, resume)──► FeedSubscription
//!             │
//!             ▼
//!   FeedMessage::Event ... Event ... (Error | Closed)   <- terminal
//! ```
//!
//! Errors and store-side closure arrive as terminal items on the sequence,
//! so a consumer's loop is "read until terminal, then reopen".

pub mod event;
pub mod memory;
pub mod notification;
pub mod source;

pub use event::{Operation, RawChangeEvent, ResumeToken};
pub use memory::MemoryFeed;
pub use notification::ChangeNotification;
pub use source::{ChangeFeedSource, FeedFilter, FeedMessage, FeedSubscription};
