//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use appserve::config::ServerConfig;
use appserve::handlers::GreetingController;
use appserve::routing::{HandlerError, RequestParam, Route, RouteRegistry};
use appserve::{start_with_config, ServerHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Directory holding `static/` with the fixture files.
pub fn fixture_resources() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/resources")
}

/// Bytes of a fixture under `static/`.
pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_resources().join("static").join(name)).unwrap()
}

/// Loopback config on an ephemeral port, short timeouts.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.static_files.root = "static".into();
    config.static_files.search_path = vec![fixture_resources().to_string_lossy().into_owned()];
    config.timeouts.read_ms = 300;
    config.timeouts.shutdown_grace_ms = 1_000;
    config.timeouts.shutdown_force_ms = 500;
    config
}

/// Greeting controller plus routes that fail and panic.
pub fn test_routes() -> RouteRegistry {
    let routes = RouteRegistry::new();
    routes.register_controller(&GreetingController);
    routes.register(Route::fallible("/fail", RequestParam::new("x", ""), |_| {
        Err(HandlerError::new("always fails"))
    }));
    routes.register(Route::new("/panic", RequestParam::new("x", ""), |_| {
        panic!("handler exploded")
    }));
    routes
}

pub async fn start_server() -> ServerHandle {
    start_with_config(&test_config(), test_routes()).await.unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

/// Write raw bytes, then read until the server closes.
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    if !request.is_empty() {
        stream.write_all(request).await.unwrap();
    }
    let mut response = Vec::new();
    match stream.read_to_end(&mut response).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {}
        Err(e) => panic!("read failed: {}", e),
    }
    response
}

/// Stop the server and wait for the drain to finish.
pub async fn stop(handle: ServerHandle) {
    handle.shutdown();
    handle.stopped().await;
    handle.join().await.unwrap();
}
