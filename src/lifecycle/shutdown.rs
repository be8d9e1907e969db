//! Shutdown coordination for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Cloned into every place that may stop the server (accept loop exit,
/// signal bridge, embedding code). `trigger` flips the running flag with a
/// compare-and-swap, so exactly one caller starts the drain; everyone else
/// gets `false`. `mark_stopped` publishes the end of the drain.
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    running: AtomicBool,
    draining: watch::Sender<bool>,
    stopped: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator in the running state.
    pub fn new() -> Self {
        let (draining, _) = watch::channel(false);
        let (stopped, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                running: AtomicBool::new(true),
                draining,
                stopped,
            }),
        }
    }

    /// Request shutdown. Returns `true` only for the call that performed the
    /// running → draining transition.
    pub fn trigger(&self) -> bool {
        if self
            .inner
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        tracing::info!("Shutting down gracefully");
        self.inner.draining.send_replace(true);
        true
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been triggered.
    pub async fn triggered(&self) {
        let mut rx = self.inner.draining.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|draining| *draining).await;
    }

    /// Publish that draining finished. Only the first call has an effect.
    pub fn mark_stopped(&self) -> bool {
        let first = !self.inner.stopped.send_replace(true);
        if first {
            tracing::info!("Stopped");
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.borrow()
    }

    /// Resolves once the server has fully stopped.
    pub async fn stopped(&self) {
        let mut rx = self.inner.stopped.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
