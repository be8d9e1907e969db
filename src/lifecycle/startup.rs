//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the server with the frozen route table
//! - Spawn the accept loop on the runtime
//! - Hand the caller a handle to observe and stop it
//!
//! # Design Decisions
//! - Fail fast: a bind error is returned before anything is spawned
//! - `start` is the minimal entry point; everything else uses defaults

use std::net::SocketAddr;

use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::net::ConnectionTracker;
use crate::routing::RouteRegistry;

/// A running server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// Address actually bound, useful when the configured port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Begin graceful shutdown. Returns `false` if it had already begun.
    pub fn shutdown(&self) -> bool {
        self.shutdown.trigger()
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Resolves once the listener is closed and connections are drained.
    pub async fn stopped(&self) {
        self.shutdown.stopped().await
    }

    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Wait for the accept loop task to finish.
    pub async fn join(self) -> Result<(), ServerError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(ServerError::Task(e.to_string())),
        }
    }
}

/// Start serving on `port` with `static_root` as the static folder.
///
/// Routes must be fully registered; the registry is frozen here.
pub async fn start(routes: RouteRegistry, port: u16, static_root: &str) -> Result<ServerHandle, ServerError> {
    let mut config = ServerConfig::default();
    config.listener.port = port;
    config.static_files.root = static_root.to_string();
    start_with_config(&config, routes).await
}

/// Start serving with a full configuration.
pub async fn start_with_config(config: &ServerConfig, routes: RouteRegistry) -> Result<ServerHandle, ServerError> {
    let server = HttpServer::bind(config, routes).await?;
    let local_addr = server.local_addr()?;
    let shutdown = server.shutdown_handle();
    let tracker = server.tracker();

    tracing::info!(address = %local_addr, "Server started");
    let task = tokio::spawn(server.run());

    Ok(ServerHandle {
        local_addr,
        shutdown,
        tracker,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RequestParam, Route};

    fn local_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener.host = "127.0.0.1".to_string();
        config.listener.port = 0;
        config
    }

    #[tokio::test]
    async fn start_and_stop() {
        let routes = RouteRegistry::new();
        routes.register(Route::new("/echo", RequestParam::new("v", ""), |v| v.to_string()));

        let handle = start_with_config(&local_config(), routes).await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        assert_eq!(handle.active_connections(), 0);

        assert!(handle.shutdown());
        assert!(!handle.shutdown());
        handle.stopped().await;
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let first = start_with_config(&local_config(), RouteRegistry::new()).await.unwrap();

        let mut config = local_config();
        config.listener.port = first.local_addr().port();
        let err = start_with_config(&config, RouteRegistry::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));

        first.shutdown();
        first.join().await.unwrap();
    }
}
