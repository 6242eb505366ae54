//! Ingress — §6. Funnels external inputs into the selector loop's event
//! channels. POST /servicedescription, POST /alert, PUT /stopped,
//! GET /healthz.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::{SelectorError, SelectorResult};
use crate::health::route::healthz;
use crate::state::SharedState;
use crate::types::{Alert, ServiceDescription, StoppedEvent};

pub fn router(state: SharedState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/servicedescription", post(service_description))
        .route("/alert", post(alert))
        .route("/stopped", put(stopped))
        .route("/healthz", get(healthz))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
        )
        .with_state(state)
}

async fn service_description(
    State(state): State<SharedState>,
    Json(description): Json<ServiceDescription>,
) -> SelectorResult<()> {
    tracing::debug!(service_id = %description.service_id, "service description received");

    state
        .service_description_tx
        .send(description)
        .await
        .map_err(|_| SelectorError::MalformedInput("selector loop is not accepting work".to_string()))
}

/// The spec's `/alert` body may be a single `Alert` object or a JSON array
/// of them — accept either.
async fn alert(State(state): State<SharedState>, body: Bytes) -> SelectorResult<()> {
    let alerts: Vec<Alert> = match serde_json::from_slice::<Vec<Alert>>(&body) {
        Ok(list) => list,
        Err(_) => {
            let single: Alert = serde_json::from_slice(&body)
                .map_err(|e| SelectorError::MalformedInput(e.to_string()))?;
            vec![single]
        }
    };

    for a in alerts {
        state
            .alert_tx
            .send(a)
            .await
            .map_err(|_| SelectorError::MalformedInput("selector loop is not accepting work".to_string()))?;
    }

    Ok(())
}

async fn stopped(
    State(state): State<SharedState>,
    Json(event): Json<StoppedEvent>,
) -> SelectorResult<()> {
    state
        .stopped_tx
        .send(event)
        .await
        .map_err(|_| SelectorError::MalformedInput("selector loop is not accepting work".to_string()))
}
