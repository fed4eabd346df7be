//! URL routing server.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id ─▶ trace ─▶ timeout ─▶ URL routing ─┬─▶ route handler
//!                                                                  └─▶ static files / 404
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use url_routing::config::{load_config, ConfigWatcher, RoutingConfig};
use url_routing::observability::{logging, metrics};
use url_routing::{handlers, RoutingServer, Shutdown};

#[derive(Parser)]
#[command(name = "url-routing")]
#[command(about = "HTTP server dispatching requests through an ordered route table", long_about = None)]
struct Cli {
    /// Route configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes when the configuration file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RoutingConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("url-routing v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (update_tx, config_updates) = mpsc::unbounded_channel();
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    if update_tx.send(config).is_err() {
                        break;
                    }
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = RoutingServer::new(config, handlers::default_registry())?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
