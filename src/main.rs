//! catalog-api
//!
//! REST backend for products, clients and users with hypermedia
//! responses and HTTP caching.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ response cache ──▶ api handler
//!                     (request id,     (optional,          │
//!                      trace,           GET only)          ▼
//!                      timeout)                        repository
//!                                                          │
//!                                                          ▼
//!     Client Response                                  hateoas envelope
//!     ◀────────────── 200 / 304 ◀──── cache annotator ◀────┘
//!                                     (ETag, Cache-Control)
//!
//!     Cross-cutting: config (hot reload) · observability · lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use catalog_api::config::{load_config, watcher::ConfigWatcher, AppConfig};
use catalog_api::http::HttpServer;
use catalog_api::lifecycle::{shutdown::DRAIN_TIMEOUT, signals, Shutdown};
use catalog_api::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "catalog-api", version, about = "Catalog REST API")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable the whole-response cache regardless of the config file.
    #[arg(long)]
    response_cache: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    logging::init_logging(&config.observability);
    tracing::info!("catalog-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_age_secs = config.http_cache.max_age_secs,
        response_cache = config.response_cache.enabled,
        page_size = config.pagination.page_size,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Config updates from the file watcher, with command-line overrides re-applied.
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let mut reload = None;
    let mut _file_watcher = None;
    if let Some(path) = &args.config {
        let (watcher, mut raw_updates) = ConfigWatcher::new(path);
        reload = Some(watcher.clone());
        match watcher.run() {
            Ok(w) => _file_watcher = Some(w),
            Err(e) => tracing::warn!(error = %e, "Config file watching disabled"),
        }
        let args_bind = args.bind.clone();
        let force_cache = args.response_cache;
        tokio::spawn(async move {
            while let Some(mut update) = raw_updates.recv().await {
                if let Some(bind) = &args_bind {
                    update.listener.bind_address = bind.clone();
                }
                update.response_cache.enabled |= force_cache;
                if update_tx.send(update).is_err() {
                    break;
                }
            }
        });
    }

    let shutdown = Shutdown::new();
    let mut stopping = shutdown.subscribe();
    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, update_rx, shutdown.subscribe()));
    tokio::spawn(signals::handle_signals(shutdown.clone(), reload));

    tokio::select! {
        result = &mut server_task => {
            result??;
            tracing::info!("Shutdown complete");
            return Ok(());
        }
        _ = stopping.recv() => {}
    }

    match tokio::time::timeout(DRAIN_TIMEOUT, server_task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Drain deadline passed, exiting"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if args.response_cache {
        config.response_cache.enabled = true;
    }
}
