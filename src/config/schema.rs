//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port used when neither the config file, `PORT` nor the CLI say otherwise.
pub const DEFAULT_PORT: u16 = 9000;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port, worker slots).
    pub listener: ListenerConfig,

    /// Static file lookup settings.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }

    /// Number of connections served concurrently.
    ///
    /// Defaults to four slots per available core, never fewer than four.
    pub fn worker_count(&self) -> usize {
        match self.listener.workers {
            Some(n) => n,
            None => {
                let cores = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                (cores * 4).max(4)
            }
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,

    /// Maximum concurrent connections (worker slots). `None` derives it
    /// from available parallelism.
    pub workers: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            workers: None,
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Folder prefix prepended to every request path ("static").
    /// A leading slash is ignored; an empty value serves bare paths.
    pub root: String,

    /// Directories searched in order; the first readable file wins.
    pub search_path: Vec<String>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "static".to_string(),
            search_path: vec![
                "resources".to_string(),
                ".".to_string(),
                "/usrapp/bin/classes".to_string(),
            ],
        }
    }
}

/// Timeout configuration, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on each read of the request head.
    pub read_ms: u64,

    /// How long shutdown waits for in-flight connections.
    pub shutdown_grace_ms: u64,

    /// How long shutdown waits after force-cancelling what is left.
    pub shutdown_force_ms: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn shutdown_force(&self) -> Duration {
        Duration::from_millis(self.shutdown_force_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_ms: 8_000,
            shutdown_grace_ms: 10_000,
            shutdown_force_ms: 5_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Human-readable or JSON lines.
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9464".to_string(),
        }
    }
}
