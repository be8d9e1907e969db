//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Register routes → Bind listener → Spawn accept loop → ServerHandle
//!
//! Shutdown (shutdown.rs):
//!     trigger() → Stop accepting → Drain connections → mark_stopped()
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger()
//! ```
//!
//! # Design Decisions
//! - Bind failure is fatal and reported before anything is served
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced cancellation after deadline
//! - Shutdown is idempotent; only the first trigger does work

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, start_with_config, ServerHandle};
