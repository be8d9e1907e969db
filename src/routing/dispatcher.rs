//! Dynamic request dispatch.
//!
//! # Responsibilities
//! - Find the route for a path with the dynamic prefix already stripped
//! - Resolve the handler's single argument from the query string
//! - Invoke the handler, containing errors and panics
//! - Turn the outcome into a response

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::registry::{HandlerError, Route, RouteTable};

/// Why a dynamic request produced no body.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler registered for {0}")]
    UnknownRoute(String),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// Map to the response the client sees.
    pub fn to_response(&self) -> Response {
        match self {
            DispatchError::UnknownRoute(_) => Response::not_found(),
            DispatchError::Handler(_) | DispatchError::Panicked(_) => Response::handler_error(),
        }
    }
}

/// The argument a route's handler receives for this request.
///
/// No query string at all means the declared default; a query string
/// without the declared key means an empty argument.
pub fn resolve_argument(route: &Route, request: &Request) -> String {
    match request.query() {
        None => route.param().default_value.clone(),
        Some(_) => request.query_value(&route.param().name).unwrap_or_default(),
    }
}

/// Run the handler registered at `path` for `request`.
pub fn dispatch(routes: &RouteTable, path: &str, request: &Request) -> Result<String, DispatchError> {
    let route = routes
        .lookup(path)
        .ok_or_else(|| DispatchError::UnknownRoute(path.to_string()))?;

    let argument = resolve_argument(route, request);
    match panic::catch_unwind(AssertUnwindSafe(|| route.invoke(&argument))) {
        Ok(result) => Ok(result?),
        Err(payload) => Err(DispatchError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Dispatch and frame the outcome: 200 `text/plain`, 404 or 500.
pub fn respond(routes: &RouteTable, path: &str, request: &Request) -> Response {
    match dispatch(routes, path, request) {
        Ok(body) => Response::text(body),
        Err(e) => {
            match &e {
                DispatchError::UnknownRoute(_) => {
                    tracing::debug!(path = %path, "No dynamic route matched");
                }
                _ => {
                    tracing::error!(path = %path, error = %e, "Handler invocation failed");
                    crate::observability::metrics::record_handler_failure();
                }
            }
            e.to_response()
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::registry::{RequestParam, RouteRegistry};
    use http::StatusCode;

    fn table() -> RouteTable {
        let registry = RouteRegistry::new();
        registry.register(Route::new(
            "/greeting",
            RequestParam::new("name", "World"),
            |name| format!("Hello, {}!", name),
        ));
        registry.register(Route::fallible(
            "/fail",
            RequestParam::new("x", "d"),
            |_| Err(HandlerError::new("nope")),
        ));
        registry.register(Route::new("/panic", RequestParam::new("x", "d"), |_| {
            panic!("handler exploded")
        }));
        registry.freeze()
    }

    fn request(target: &str) -> Request {
        Request::parse_request_line(&format!("GET {} HTTP/1.1", target)).unwrap()
    }

    #[test]
    fn default_used_without_query() {
        let body = dispatch(&table(), "/greeting", &request("/app/greeting")).unwrap();
        assert_eq!(body, "Hello, World!");
    }

    #[test]
    fn query_value_used_when_present() {
        let body = dispatch(&table(), "/greeting", &request("/app/greeting?name=Jaider")).unwrap();
        assert_eq!(body, "Hello, Jaider!");
    }

    #[test]
    fn missing_key_is_empty_not_default() {
        let body = dispatch(&table(), "/greeting", &request("/app/greeting?other=1")).unwrap();
        assert_eq!(body, "Hello, !");
    }

    #[test]
    fn unknown_route_is_404() {
        let err = dispatch(&table(), "/nothing", &request("/app/nothing")).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownRoute(ref p) if p == "/nothing"));
        assert_eq!(err.to_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn handler_errors_become_500() {
        let response = respond(&table(), "/fail", &request("/app/fail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"ERROR");
    }

    #[test]
    fn panics_are_contained() {
        let err = dispatch(&table(), "/panic", &request("/app/panic")).unwrap_err();
        match err {
            DispatchError::Panicked(message) => assert_eq!(message, "handler exploded"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            respond(&table(), "/panic", &request("/app/panic")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn success_is_text_plain() {
        let response = respond(&table(), "/greeting", &request("/app/greeting?name=Ana"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), "text/plain");
        assert_eq!(response.body(), b"Hello, Ana!");
    }
}
