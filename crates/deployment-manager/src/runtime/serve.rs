//! Serve — bind the axum HTTP listener and run it alongside the Docker
//! event subscription, until shutdown is signalled.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::config::DeploymentManagerConfig;
use crate::ingress;
use crate::state::SharedState;
use crate::subscription;

pub async fn serve(state: SharedState, config: DeploymentManagerConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("invalid bind address")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let subscription_state = state.clone();
    let subscription_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        loop {
            subscription::run(subscription_state.clone(), subscription_shutdown.clone()).await;
            if *subscription_shutdown.borrow() {
                return;
            }
            tracing::info!("restarting docker event subscription after EOF");
        }
    });

    tokio::spawn(crate::runtime::shutdown::broadcast_on_signal(shutdown_tx));

    let router = ingress::router(state);
    let listener = TcpListener::bind(addr).await.context("failed to bind listener")?;

    info!(%addr, "deployment-manager ready");

    let mut shutdown_rx = shutdown_rx;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .context("http server error")?;

    info!("deployment-manager server shutdown complete");
    Ok(())
}
