//! Client connection registry
//!
//! The registry owns every open push connection and its keep-alive task.
//! It is the only component that mutates the connection map; the
//! broadcaster borrows a snapshot of sinks during a send pass.
//!
//! ```text
//!                      Arc<ClientRegistry>
//!                 ┌───────────────────────────┐
//!                 │ connections: HashMap<id,  │
//!                 │   ClientConnection {      │
//!                 │     sink: mpsc::Sender,   │
//!                 │     keep_alive: task,     │
//!                 │   }                       │
//!                 │ >                         │
//!                 └────────────┬──────────────┘
//!                              │ snapshot()
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!         [SSE client]    [SSE client]    [SSE client]
//! ```
//!
//! Invariant: removing an entry always stops its keep-alive task, so no
//! timer ever outlives its connection.

pub mod connection;
pub mod store;

pub use connection::ClientConnection;
pub use store::ClientRegistry;
