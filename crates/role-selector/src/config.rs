//! Role-selector configuration — layered TOML/env, plus the bare
//! environment variable names the specification mandates directly.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::HardwareTag;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleSelectorConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// This node's hardware tag (`HARDWARE`).
    pub hardware: String,
    /// `POLICY ∈ {eager, lazy, consensus}`.
    pub policy: String,
    /// Consensus peer address (`ENDPOINT`), used only when `policy = consensus`.
    #[serde(default)]
    pub endpoint: String,
    /// Base URL of the deployment manager this node's role runner targets.
    pub dsm_url: String,
    pub sla_manager_url: String,
    /// Periodic tick interval for `checkRoles` polling, e.g. "10s".
    pub role_selection_interval_secs: u64,
    /// Bind address for the Consensus policy's inbound gRPC server.
    pub consensus_bind_address: String,
    pub consensus_cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl RoleSelectorConfig {
    /// Load configuration from `role-selector.toml` and environment
    /// variables, then apply the specification's bare environment-variable
    /// names as a final override layer.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&RoleSelectorConfig::default())
            .context("failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        let config_paths = [
            "/etc/colmena/role-selector",
            "config/role-selector",
            "crates/role-selector/config/role-selector",
        ];
        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ROLESELECTOR")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: RoleSelectorConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.apply_bare_env_overrides();
        Ok(cfg)
    }

    fn apply_bare_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HARDWARE") {
            self.hardware = v;
        }
        if let Ok(v) = std::env::var("POLICY") {
            self.policy = v;
        }
        if let Ok(v) = std::env::var("ENDPOINT") {
            self.endpoint = v;
        }
        if let Ok(v) = std::env::var("DSM_URL") {
            self.dsm_url = v;
        }
        if let Ok(v) = std::env::var("SLA_MANAGER_URL") {
            self.sla_manager_url = v;
        }
        if let Ok(v) = std::env::var("ROLE_SELECTION_INTERVAL") {
            if let Some(secs) = parse_duration_secs(&v) {
                self.role_selection_interval_secs = secs;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("invalid server.bind_address")?;
        if self.policy == "consensus" && self.endpoint.is_empty() {
            anyhow::bail!("policy=consensus requires ENDPOINT to be set");
        }
        Ok(())
    }

    pub fn hardware_tag(&self) -> HardwareTag {
        HardwareTag::new(self.hardware.clone())
    }

    pub fn role_selection_interval(&self) -> Duration {
        Duration::from_secs(self.role_selection_interval_secs)
    }

    pub fn consensus_cooldown(&self) -> Duration {
        Duration::from_secs(self.consensus_cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Parse a duration like `"10s"` (the only unit the spec's example uses).
/// Bare integers are treated as seconds.
fn parse_duration_secs(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Some(num) = trimmed.strip_suffix('s') {
        num.parse().ok()
    } else {
        trimmed.parse().ok()
    }
}

impl Default for RoleSelectorConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:5555".to_string(),
                request_timeout_secs: 10,
            },
            logging: LoggingConfig {
                level: "info,role_selector=debug".to_string(),
            },
            hardware: "CPU".to_string(),
            policy: "eager".to_string(),
            endpoint: String::new(),
            dsm_url: "http://localhost:50551".to_string(),
            sla_manager_url: "http://localhost:8081".to_string(),
            role_selection_interval_secs: 10,
            consensus_bind_address: "0.0.0.0:50055".to_string(),
            consensus_cooldown_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(RoleSelectorConfig::default().validate().is_ok());
    }

    #[test]
    fn consensus_without_endpoint_fails_validation() {
        let mut cfg = RoleSelectorConfig::default();
        cfg.policy = "consensus".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_seconds_suffixed_duration() {
        assert_eq!(parse_duration_secs("10s"), Some(10));
        assert_eq!(parse_duration_secs("10"), Some(10));
        assert_eq!(parse_duration_secs("abc"), None);
    }
}
