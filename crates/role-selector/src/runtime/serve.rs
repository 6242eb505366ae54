//! Serve — run the axum ingress, the selector loop, and (for the
//! Consensus policy) the inbound gRPC server, until shutdown is signalled.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::ingress;
use crate::policy::consensus::{SchedulingServiceServer, TriggerRoleService};
use crate::policy::Policy;
use crate::runtime::boot::Booted;

pub async fn serve(booted: Booted) -> Result<()> {
    let Booted {
        state,
        selector,
        config,
        service_description_rx,
        alert_rx,
        stopped_rx,
        decision_rx,
        decision_tx,
    } = booted;

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("invalid server.bind_address")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if matches!(selector.policy(), Policy::Consensus(_)) {
        let consensus_addr: SocketAddr = config
            .consensus_bind_address
            .parse()
            .context("invalid consensus_bind_address")?;
        tokio::spawn(run_consensus_server(consensus_addr, decision_tx, shutdown_rx.clone()));
    }

    let selector_loop = selector.clone();
    let selector_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        selector_loop
            .run(
                selector_shutdown,
                service_description_rx,
                alert_rx,
                stopped_rx,
                decision_rx,
            )
            .await;
    });

    tokio::spawn(crate::runtime::shutdown::broadcast_on_signal(shutdown_tx));

    let router = ingress::router(state, config.request_timeout());
    let listener = TcpListener::bind(addr).await.context("failed to bind listener")?;

    info!(%addr, "role-selector ready");

    let mut shutdown_rx = shutdown_rx;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .context("http server error")?;

    info!("role-selector server shutdown complete");
    Ok(())
}

async fn run_consensus_server(
    addr: SocketAddr,
    decision_tx: tokio::sync::mpsc::Sender<crate::types::Decision>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(%addr, "consensus inbound gRPC server starting");
    let service = TriggerRoleService::new(decision_tx);

    let server = tonic::transport::Server::builder()
        .add_service(SchedulingServiceServer::new(service))
        .serve_with_shutdown(addr, async move {
            let _ = shutdown_rx.changed().await;
        });

    if let Err(err) = server.await {
        tracing::error!(error = %err, "consensus gRPC server exited with an error");
    }
}
