//! Game catalog server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP──▶ net::Listener ──▶ server::Server (accept loop)
//!                                           │ one task per connection
//!                                           ▼
//!                                 server::ConnectionHandler
//!                      read_request → routing::Router → encode_response
//!                                           │
//!                        ┌──────────────────┴───────────────────┐
//!                        ▼                                      ▼
//!               POST /disconnect                      /{resource}[/{id}]
//!              (delay, then "ACK")             controllers::ResourceController
//!                                                              │
//!                                                              ▼
//!                                                repository (memory | file)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use catalog_server::config::{load_config, ServerConfig};
use catalog_server::lifecycle::signals::shutdown_signal;
use catalog_server::observability::{logging, metrics};
use catalog_server::start_server;

#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(about = "Serve the game catalog over a minimal HTTP/1.1 protocol", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "catalog-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = ?config.listener.max_connections,
        storage = ?config.storage.backend,
        resources = ?config.resources,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = start_server(&config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        shutdown_signal().await;
        handle.stop();
    });

    server.start().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
