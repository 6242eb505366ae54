//! Shutdown — ctrl_c/SIGTERM, broadcast over a watch channel.

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Wait for Ctrl+C or SIGTERM, then flip the shared shutdown flag.
pub async fn broadcast_on_signal(tx: watch::Sender<bool>) {
    wait_for_signal().await;
    info!("shutdown signal received, notifying subsystems");
    let _ = tx.send(true);
}

async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
