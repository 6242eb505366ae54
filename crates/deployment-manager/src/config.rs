//! Deployment-manager configuration — layered TOML/env, plus the bare
//! environment variable names the specification mandates directly.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeploymentManagerConfig {
    pub server: ServerConfig,
    pub docker: DockerConfig,
    pub logging: LoggingConfig,
    /// This node's unique identifier, propagated to containers as
    /// `AGENT_ID`/`HOSTNAME`.
    pub agent_id: String,
    /// Network interface name passed to containers as
    /// `PEER_DISCOVERY_INTERFACE`.
    pub peer_discovery_interface: String,
    /// Base URL of the role-selector this node reports `StoppedEvent`s to.
    pub role_selector_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DockerConfig {
    /// Empty string means "use the default socket".
    pub socket_path: String,
    pub image_pull_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl DeploymentManagerConfig {
    /// Load configuration from `deployment-manager.toml` and environment
    /// variables, then apply the specification's bare environment-variable
    /// names as a final override layer.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&DeploymentManagerConfig::default())
            .context("failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        let config_paths = [
            "/etc/colmena/deployment-manager",
            "config/deployment-manager",
            "crates/deployment-manager/config/deployment-manager",
        ];
        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DEPLOYMENTMANAGER")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: DeploymentManagerConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.apply_bare_env_overrides();
        Ok(cfg)
    }

    /// Apply the bare environment variable names the specification lists
    /// directly (`AGENT_ID`, `PEER_DISCOVERY_INTERFACE`, `ROLE_SELECTOR_URL`),
    /// overriding whatever the layered config produced.
    fn apply_bare_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AGENT_ID") {
            self.agent_id = v;
        }
        if let Ok(v) = std::env::var("PEER_DISCOVERY_INTERFACE") {
            self.peer_discovery_interface = v;
        }
        if let Ok(v) = std::env::var("ROLE_SELECTOR_URL") {
            self.role_selector_url = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("invalid server.bind_address")?;
        Ok(())
    }

    pub fn image_pull_timeout(&self) -> Duration {
        Duration::from_secs(self.docker.image_pull_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for DeploymentManagerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:50551".to_string(),
                request_timeout_secs: 10,
            },
            docker: DockerConfig {
                socket_path: String::new(),
                image_pull_timeout_secs: 600,
            },
            logging: LoggingConfig {
                level: "info,deployment_manager=debug".to_string(),
            },
            agent_id: "deployment-manager".to_string(),
            peer_discovery_interface: "eth0".to_string(),
            role_selector_url: "http://role-selector:5555".to_string(),
        }
    }
}
