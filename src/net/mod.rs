//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, worker-slot limit)
//!     → connection.rs (id, in-flight tracking)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     AwaitRequestLine → Parsed → Static/Dynamic → ResponseWritten → Closed
//! ```
//!
//! # Design Decisions
//! - A slot is taken before accepting, so a saturated server stops accepting
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError, WorkerSlot};
