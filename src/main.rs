//! appserve
//!
//! A minimal embedded HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::server (worker task per connection)
//!                                      │
//!                        ┌─────────────┴─────────────┐
//!                        ▼                           ▼
//!                 /app/<route>                  anything else
//!             routing::dispatcher           http::static_files
//!              (RouteTable, frozen)        (search path + MIME)
//!                        │                           │
//!                        └─────────────┬─────────────┘
//!                                      ▼
//!                        http::response ──▶ close
//! ```
//!
//! Cross-cutting: config (TOML + `PORT`), observability (tracing, Prometheus),
//! lifecycle (signals → shutdown → drain).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use appserve::config::{apply_env_overrides, load_config, validate_config, ServerConfig};
use appserve::handlers::GreetingController;
use appserve::lifecycle::signals;
use appserve::observability::{logging, metrics};
use appserve::{HttpServer, RouteRegistry};

#[derive(Parser, Debug)]
#[command(name = "appserve", version, about = "Serve static files and /app handlers")]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "APPSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port. Takes precedence over `PORT` and the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Folder, relative to each search directory, holding static files.
    #[arg(long)]
    static_root: Option<String>,
}

fn build_config(args: &Args) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    apply_env_overrides(&mut config)?;

    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if let Some(host) = &args.host {
        config.listener.host = host.clone();
    }
    if let Some(root) = &args.static_root {
        config.static_files.root = root.clone();
    }

    validate_config(&config).map_err(appserve::config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("appserve: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("appserve v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.bind_address(),
        workers = config.worker_count(),
        static_root = %config.static_files.root,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let routes = RouteRegistry::new();
    routes.register_controller(&GreetingController);

    let server = match HttpServer::bind(&config, routes).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start server");
            return ExitCode::FAILURE;
        }
    };

    let _signals = signals::bridge(server.shutdown_handle());

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
