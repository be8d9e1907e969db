//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Controller::routes() / Route::new(..)
//!     → registry.rs (RouteRegistry, concurrent inserts)
//!     → freeze() → RouteTable (immutable)
//!
//! Per request:
//!     request path
//!     → matcher.rs (static or dynamic by prefix)
//!     → dispatcher.rs (lookup, argument, invoke) for dynamic paths
//! ```
//!
//! # Design Decisions
//! - Routes registered before the listener accepts, immutable at runtime
//! - Exact path lookup, no patterns
//! - Explicit 404 for unknown dynamic paths rather than a silent default

pub mod dispatcher;
pub mod matcher;
pub mod registry;

pub use dispatcher::{dispatch, DispatchError};
pub use matcher::{PathPrefixMatcher, Target, DYNAMIC_PREFIX};
pub use registry::{Controller, HandlerError, RequestParam, Route, RouteRegistry, RouteTable};
