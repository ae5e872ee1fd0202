use std::future;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Resolves once SIGINT or SIGTERM is received
///
/// Used as the graceful shutdown trigger for `axum::serve`. If a handler
/// cannot be installed that branch never resolves and the other one still
/// works.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to setup SIGINT handler: {}", e);
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to setup SIGTERM handler: {}", e);
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        _ = interrupt => {
            info!("SIGINT received, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("SIGTERM received, initiating graceful shutdown");
        }
    }
}
