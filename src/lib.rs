//! Minimal embedded HTTP server: static files plus `/app` handlers.

pub mod config;
pub mod handlers;
pub mod http;
pub mod net;
pub mod routing;

pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::{HttpServer, ServerError};
pub use lifecycle::{start, start_with_config, ServerHandle, Shutdown};
pub use routing::{Controller, RequestParam, Route, RouteRegistry};
