//! Boot — logging init, config load, policy/selector construction.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::RoleSelectorConfig;
use crate::kpi_retriever::KpiRetriever;
use crate::policy::{ConsensusPolicy, Policy};
use crate::role_runner::{HttpRoleRunner, RoleRunner};
use crate::selector::Selector;
use crate::state::{RoleSelectorState, SharedState};
use crate::types::{Alert, Decision, ServiceDescription, StoppedEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;

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

/// Everything `serve` needs to start the ingress router and the selector
/// loop, plus (when policy = consensus) the pieces to start the inbound
/// gRPC server.
pub struct Booted {
    pub state: SharedState,
    pub selector: Arc<Selector>,
    pub config: RoleSelectorConfig,
    pub service_description_rx: mpsc::Receiver<ServiceDescription>,
    pub alert_rx: mpsc::Receiver<Alert>,
    pub stopped_rx: mpsc::Receiver<StoppedEvent>,
    pub decision_rx: mpsc::Receiver<Decision>,
    pub decision_tx: mpsc::Sender<Decision>,
}

pub fn boot() -> Result<Booted> {
    let config = RoleSelectorConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_configured_logging(&config.logging.level);

    info!(
        bind_address = %config.server.bind_address,
        policy = %config.policy,
        hardware = %config.hardware,
        "starting role-selector"
    );

    let policy = build_policy(&config)?;
    let runner: Arc<dyn RoleRunner> = Arc::new(HttpRoleRunner::new(config.dsm_url.clone()));
    let kpi_retriever = KpiRetriever::new(config.sla_manager_url.clone());

    let selector = Arc::new(Selector::new(
        config.hardware_tag(),
        policy,
        runner,
        kpi_retriever,
        config.role_selection_interval(),
        true,
    ));

    let (service_description_tx, service_description_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (alert_tx, alert_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (stopped_tx, stopped_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (decision_tx, decision_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let state: SharedState = Arc::new(RoleSelectorState {
        service_description_tx,
        alert_tx,
        stopped_tx,
    });

    Ok(Booted {
        state,
        selector,
        config,
        service_description_rx,
        alert_rx,
        stopped_rx,
        decision_rx,
        decision_tx,
    })
}

fn build_policy(config: &RoleSelectorConfig) -> Result<Policy> {
    match config.policy.as_str() {
        "eager" => Ok(Policy::Eager),
        "lazy" => Ok(Policy::Lazy),
        "consensus" => {
            let cooldown: Duration = config.consensus_cooldown();
            Ok(Policy::Consensus(ConsensusPolicy::new(
                config.endpoint.clone(),
                cooldown,
            )))
        }
        other => anyhow::bail!("unknown POLICY `{other}` (expected eager, lazy, or consensus)"),
    }
}
