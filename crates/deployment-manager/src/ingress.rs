//! Ingress — PUT /start, PUT /stop, GET /healthz.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::docker::RunSpec;
use crate::error::DeploymentResult;
use crate::health::route::healthz;
use crate::state::SharedState;
use crate::types::{StartRoleCommand, StopRoleCommand};

pub fn router(state: SharedState) -> Router {
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/start", put(start))
        .route("/stop", put(stop))
        .route("/healthz", get(healthz))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
        )
        .with_state(state)
}

async fn start(
    State(state): State<SharedState>,
    Json(cmd): Json<StartRoleCommand>,
) -> DeploymentResult<()> {
    tracing::info!(
        service_id = %cmd.service_id,
        role_id = %cmd.role_id,
        image_id = %cmd.image_id,
        "starting role container"
    );

    state
        .docker
        .run_container(RunSpec {
            service_id: &cmd.service_id,
            role_id: &cmd.role_id,
            image_id: &cmd.image_id,
            agent_id: &state.config.agent_id,
            peer_discovery_interface: &state.config.peer_discovery_interface,
            image_pull_timeout: state.config.image_pull_timeout(),
        })
        .await?;

    Ok(())
}

async fn stop(
    State(state): State<SharedState>,
    Json(cmd): Json<StopRoleCommand>,
) -> DeploymentResult<()> {
    tracing::info!(
        service_id = %cmd.service_id,
        role_id = %cmd.role_id,
        image_id = %cmd.image_id,
        remove = cmd.remove_container,
        "stopping role container"
    );

    state
        .docker
        .stop_container(&cmd.image_id, cmd.remove_container)
        .await?;

    Ok(())
}
