//! Boot — logging init, config load, Docker connection, state creation.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DeploymentManagerConfig;
use crate::docker::DockerClient;
use crate::state::{DeploymentManagerState, SharedState};

/// Bootstrap subscriber used while loading configuration, before the
/// configured log level is known.
pub fn init_bootstrap_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

/// Re-initialise logging with the level from the loaded configuration.
pub fn init_configured_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Load config, connect to Docker, and build shared state.
pub async fn boot() -> Result<(SharedState, DeploymentManagerConfig)> {
    let config = DeploymentManagerConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_configured_logging(&config.logging.level);

    info!(bind_address = %config.server.bind_address, "starting deployment-manager");

    let docker_client = DockerClient::new(&config.docker.socket_path)
        .context("failed to connect to the docker daemon")?;
    info!("connected to docker daemon");

    let state = DeploymentManagerState::new(docker_client, config.clone());

    Ok((state, config))
}
