//! Bounded TCP acceptor.
//!
//! # Responsibilities
//! - Bind the server socket
//! - Hand out connections only while a worker slot is free
//!
//! # Design Decisions
//! - The slot is reserved before `accept`, so a saturated server leaves new
//!   clients in the kernel backlog instead of queueing them in memory
//! - The slot travels with the connection and is released on drop

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    Bind(io::Error),
    Accept(io::Error),
    /// No more slots will ever be handed out.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "bind failed: {}", e),
            ListenerError::Accept(e) => write!(f, "accept failed: {}", e),
            ListenerError::Closed => write!(f, "worker slots closed"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Server socket paired with a fixed number of worker slots.
#[derive(Debug)]
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    worker_slots: usize,
}

impl Listener {
    /// Bind `address` ("host:port"); at most `worker_slots` connections are
    /// served at once.
    pub async fn bind(address: &str, worker_slots: usize) -> Result<Self, ListenerError> {
        let socket = TcpListener::bind(address).await.map_err(ListenerError::Bind)?;
        let bound = socket.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %bound, worker_slots, "Listener bound");

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(worker_slots)),
            worker_slots,
        })
    }

    /// Wait for a free slot, then for a connection.
    ///
    /// Cancel-safe: dropping the future gives the slot back.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, WorkerSlot), ListenerError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;
        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(peer = %peer, free_slots = self.slots.available_permits(), "Connection accepted");
        Ok((stream, peer, WorkerSlot { _permit: permit }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn worker_slots(&self) -> usize {
        self.worker_slots
    }
}

/// One occupied worker slot; freed when dropped, panics included.
#[derive(Debug)]
pub struct WorkerSlot {
    _permit: OwnedSemaphorePermit,
}
