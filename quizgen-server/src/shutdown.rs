//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use crate::state::AppState;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). If a handler cannot be
/// installed, only the other signal is awaited.
pub async fn shutdown_signal() {
    let sigterm = signal(SignalKind::terminate()).map_err(|e| {
        tracing::error!("failed to install SIGTERM handler: {}", e);
    });
    let sigint = signal(SignalKind::interrupt()).map_err(|e| {
        tracing::error!("failed to install SIGINT handler: {}", e);
    });

    let terminate = async {
        match sigterm {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(()) => std::future::pending::<()>().await,
        }
    };
    let interrupt = async {
        match sigint {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(()) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = interrupt => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// Returns a Notify that can be used to signal when shutdown is complete.
pub fn spawn_config_reload_handler(
    state: AppState,
    config_loader: Arc<ConfigLoader>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGHUP handler, reload disabled: {}", e);
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(sections) => {
                            if sections.server.listen != state.config.server().await.listen {
                                tracing::warn!("listen address changes take effect on restart");
                            }
                            state.reload(sections).await;
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}
