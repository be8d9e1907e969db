//! Route registry.
//!
//! # Responsibilities
//! - Bind exact paths to single-argument handlers
//! - Accept registrations from several sources concurrently
//! - Freeze into an immutable table before traffic starts
//!
//! # Design Decisions
//! - Exact match only, no wildcards
//! - Last registration for a path wins (logged)
//! - Handlers take exactly one string argument; extra parameters are not
//!   supported by the dispatch contract
//! - Writes stop at `freeze()`; the server only ever reads a `RouteTable`

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

/// Failure reported by a handler.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Callable behind a dynamic route.
pub type HandlerFn = dyn Fn(&str) -> Result<String, HandlerError> + Send + Sync;

/// Metadata about a handler's single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParam {
    /// Query-string key the argument is read from.
    pub name: String,
    /// Value passed when the request has no query string at all.
    pub default_value: String,
}

impl RequestParam {
    pub fn new(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
        }
    }
}

/// A path bound to a handler.
#[derive(Clone)]
pub struct Route {
    path: String,
    param: RequestParam,
    handler: Arc<HandlerFn>,
}

impl Route {
    /// Route for a handler that cannot fail.
    pub fn new<F>(path: impl Into<String>, param: RequestParam, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::fallible(path, param, move |arg: &str| Ok(handler(arg)))
    }

    /// Route for a handler that reports failures.
    pub fn fallible<F>(path: impl Into<String>, param: RequestParam, handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, HandlerError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            param,
            handler: Arc::new(handler),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self) -> &RequestParam {
        &self.param
    }

    /// Call the handler with its one argument.
    pub fn invoke(&self, arg: &str) -> Result<String, HandlerError> {
        (self.handler)(arg)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}

/// A source of routes, registered as a unit.
///
/// Implementors play the part of an annotated controller: they declare
/// their paths, parameter metadata and handlers in one place.
pub trait Controller {
    fn routes(&self) -> Vec<Route>;
}

/// Mutable registry used while the application is being assembled.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: DashMap<String, Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route. Returns the route it replaced, if any.
    pub fn register(&self, route: Route) -> Option<Route> {
        let path = route.path.clone();
        let previous = self.routes.insert(path.clone(), route);
        if previous.is_some() {
            tracing::warn!(path = %path, "Route re-registered; last registration wins");
        } else {
            tracing::debug!(path = %path, "Route registered");
        }
        previous
    }

    /// Register every route a controller declares.
    pub fn register_controller(&self, controller: &dyn Controller) -> usize {
        let routes = controller.routes();
        let count = routes.len();
        for route in routes {
            self.register(route);
        }
        count
    }

    pub fn lookup(&self, path: &str) -> Option<Route> {
        self.routes.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Stop accepting registrations and produce the read-only table.
    pub fn freeze(self) -> RouteTable {
        RouteTable {
            routes: self.routes.into_iter().collect(),
        }
    }
}

/// Immutable route table read concurrently by every connection.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
