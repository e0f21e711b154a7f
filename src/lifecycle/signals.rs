//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP re-reads the config file, it never stops the server

use crate::config::watcher::ConfigWatcher;
use crate::lifecycle::shutdown::Shutdown;

/// Wait for signals until a termination signal arrives, then trigger shutdown.
///
/// `reload` is re-run on every SIGHUP when a config file is in use.
pub async fn handle_signals(shutdown: Shutdown, reload: Option<ConfigWatcher>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let handlers = (signal(SignalKind::terminate()), signal(SignalKind::hangup()));
        let (mut term, mut hup) = match handlers {
            (Ok(term), Ok(hup)) => (term, hup),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(
                    error = %e,
                    "Failed to install signal handlers, falling back to Ctrl+C"
                );
                wait_for_ctrl_c().await;
                shutdown.trigger();
                return;
            }
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("SIGINT received");
                    break;
                }
                _ = term.recv() => {
                    tracing::info!("SIGTERM received");
                    break;
                }
                _ = hup.recv() => match &reload {
                    Some(watcher) => {
                        tracing::info!("SIGHUP received, reloading configuration");
                        watcher.reload_now();
                    }
                    None => tracing::info!("SIGHUP received, no config file to reload"),
                },
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = reload;
        wait_for_ctrl_c().await;
    }

    shutdown.trigger();
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
