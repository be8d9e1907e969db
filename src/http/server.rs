//! HTTP server engine.
//!
//! # Responsibilities
//! - Own the listener and run the accept loop
//! - Run each connection on a bounded set of worker tasks
//! - Parse the request line, route static vs dynamic, write one response
//! - Close every connection on every exit path
//! - Drain in-flight connections on shutdown, then force-cancel
//!
//! # Design Decisions
//! - One request per connection; `Connection: close` always
//! - Routes and static root are frozen before the first accept
//! - A connection's failure never reaches the accept loop
//! - Shutdown is an explicit `Shutdown` signal, never a process hook

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::http::request::{read_request, RequestError};
use crate::http::response::Response;
use crate::http::static_files::StaticFiles;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionState, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{dispatcher, PathPrefixMatcher, RouteRegistry, RouteTable, Target};

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound; nothing is served.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The task running the accept loop died.
    #[error("server task failed: {0}")]
    Task(String),
}

/// State shared read-only by every connection.
#[derive(Debug)]
pub struct AppState {
    routes: RouteTable,
    files: StaticFiles,
    matcher: PathPrefixMatcher,
    read_timeout: Duration,
    tracker: ConnectionTracker,
}

impl AppState {
    pub fn new(routes: RouteTable, files: StaticFiles, read_timeout: Duration) -> Self {
        Self {
            routes,
            files,
            matcher: PathPrefixMatcher::default(),
            read_timeout,
            tracker: ConnectionTracker::new(),
        }
    }
}

/// Outcome of one served connection, for logs and metrics.
#[derive(Debug, Clone, Copy)]
struct Served {
    kind: &'static str,
    status: u16,
}

/// The embedded HTTP server.
pub struct HttpServer {
    listener: Listener,
    state: Arc<AppState>,
    shutdown: Shutdown,
    grace: Duration,
    force_grace: Duration,
}

impl HttpServer {
    /// Bind the listener and freeze the routes.
    ///
    /// Registration must be complete before this call; the registry is
    /// consumed.
    pub async fn bind(config: &ServerConfig, routes: RouteRegistry) -> Result<Self, ServerError> {
        let address = config.bind_address();
        let listener = Listener::bind(&address, config.worker_count())
            .await
            .map_err(|e| match e {
                ListenerError::Bind(source) => ServerError::Bind { address, source },
                other => ServerError::Io(io::Error::new(io::ErrorKind::Other, other.to_string())),
            })?;

        let routes = routes.freeze();
        let files = StaticFiles::from_config(&config.static_files);
        tracing::info!(
            routes = routes.len(),
            static_root = ?files.root(),
            read_timeout_ms = config.timeouts.read_ms,
            "Server configured"
        );

        Ok(Self {
            listener,
            state: Arc::new(AppState::new(routes, files, config.timeouts.read())),
            shutdown: Shutdown::new(),
            grace: config.timeouts.shutdown_grace(),
            force_grace: config.timeouts.shutdown_force(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn tracker(&self) -> ConnectionTracker {
        self.state.tracker.clone()
    }

    /// Accept until shutdown, then drain.
    pub async fn run(self) -> Result<(), ServerError> {
        let HttpServer {
            listener,
            state,
            shutdown,
            grace,
            force_grace,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                worker_slots = listener.worker_slots(),
                "HTTP server accepting"
            );
        }

        let mut workers: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                biased;

                _ = shutdown.triggered() => break,

                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection task panicked");
                        }
                    }
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, slot)) => {
                        let state = Arc::clone(&state);
                        workers.spawn(async move {
                            let _slot = slot;
                            handle_connection(stream, peer, &state).await;
                        });
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        metrics::record_accept_error();
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        // The loop can also end on its own; both paths converge here.
        shutdown.trigger();
        drop(listener);
        drain(&mut workers, grace, force_grace).await;
        shutdown.mark_stopped();
        Ok(())
    }
}

/// Wait for in-flight connections, then cancel whatever is left.
async fn drain(workers: &mut JoinSet<()>, grace: Duration, force_grace: Duration) {
    if workers.is_empty() {
        return;
    }
    tracing::info!(
        in_flight = workers.len(),
        grace_ms = grace.as_millis() as u64,
        "Draining connections"
    );
    if tokio::time::timeout(grace, join_all(workers)).await.is_ok() {
        return;
    }

    tracing::warn!(remaining = workers.len(), "Grace period elapsed, cancelling connections");
    workers.abort_all();
    if tokio::time::timeout(force_grace, join_all(workers)).await.is_err() {
        tracing::error!(remaining = workers.len(), "Connections still running after cancellation");
    }
}

async fn join_all(workers: &mut JoinSet<()>) {
    while workers.join_next().await.is_some() {}
}

/// Serve one connection end to end and close it.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, state: &AppState) {
    let guard = state.tracker.track();
    let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);

    async move {
        let start = Instant::now();
        match serve_connection(&mut stream, state).await {
            Ok(Some(served)) => {
                metrics::record_request(served.kind, served.status, start);
                tracing::info!(
                    status = served.status,
                    kind = served.kind,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Response written"
                );
            }
            Ok(None) => tracing::debug!("Connection abandoned without a response"),
            Err(e) if e.is_reset() => {
                tracing::debug!(state = ?ConnectionState::Reset, "Connection reset by peer");
            }
            Err(e) => tracing::warn!(error = %e, "Client error"),
        }

        let _ = stream.shutdown().await;
        tracing::trace!(state = ?ConnectionState::Closed, "Socket closed");
        drop(guard);
    }
    .instrument(span)
    .await
}

async fn serve_connection(stream: &mut TcpStream, state: &AppState) -> Result<Option<Served>, RequestError> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    tracing::trace!(state = ?ConnectionState::AwaitRequestLine, "Waiting for request line");

    let request = match read_request(&mut reader, state.read_timeout).await {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(None),
        Err(RequestError::Timeout) => {
            tracing::debug!(state = ?ConnectionState::Timeout, "No request line before timeout");
            Response::request_timeout().write_to(&mut writer).await?;
            return Ok(Some(Served {
                kind: "timeout",
                status: 408,
            }));
        }
        Err(RequestError::Malformed(line)) => {
            tracing::debug!(line = %line, "Malformed request line, abandoning");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(
        state = ?ConnectionState::Parsed,
        method = request.method(),
        path = request.path(),
        "Request parsed"
    );

    let target = state.matcher.classify(request.path());
    let response = match target {
        Target::Static(path) => {
            tracing::trace!(state = ?ConnectionState::StaticRoute, "Serving static resource");
            match state.files.resolve(path).await {
                Some(file) => Response::ok(file.content_type, file.bytes),
                None => Response::not_found(),
            }
        }
        Target::Dynamic(path) => {
            tracing::trace!(state = ?ConnectionState::DynamicRoute, "Dispatching to handler");
            dispatcher::respond(&state.routes, path, &request)
        }
    };

    response.write_to(&mut writer).await?;
    tracing::trace!(state = ?ConnectionState::ResponseWritten, bytes = response.body().len(), "Response flushed");

    Ok(Some(Served {
        kind: target.kind(),
        status: response.status().as_u16(),
    }))
}
