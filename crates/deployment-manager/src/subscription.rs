//! Container event subscription — synthesizes `StoppedEvent`s from Docker
//! `die` events and reports them back to the role selector.

use futures_util::StreamExt;
use tokio::sync::watch;

use crate::docker::container::{LABEL_IMAGE_ID, LABEL_ROLE_ID, LABEL_SERVICE_ID};
use crate::state::SharedState;
use crate::types::StoppedEvent;

/// Run the subscription loop until the stream ends (EOF) or shutdown is
/// signalled. Per §4.6, EOF terminates the loop and the caller restarts it;
/// stream errors other than EOF are logged and the loop continues.
pub async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let mut events = state.docker.stream_die_events();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("shutdown signalled, stopping event subscription");
                    return;
                }
            }
            next = events.next() => {
                match next {
                    Some(Ok(event)) => handle_die_event(&state, event).await,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "docker event stream error");
                    }
                    None => {
                        tracing::warn!("docker event stream ended (EOF), subscription will be restarted");
                        return;
                    }
                }
            }
        }
    }
}

async fn handle_die_event(state: &SharedState, event: bollard::models::EventMessage) {
    let Some(actor) = event.actor else { return };
    let Some(attributes) = actor.attributes else {
        return;
    };

    let role_id = attributes.get(LABEL_ROLE_ID).cloned().unwrap_or_default();
    let service_id = attributes
        .get(LABEL_SERVICE_ID)
        .cloned()
        .unwrap_or_default();
    let image_id = attributes
        .get(LABEL_IMAGE_ID)
        .cloned()
        .unwrap_or_default();

    if role_id.is_empty() || service_id.is_empty() {
        return;
    }

    let stopped = StoppedEvent {
        service_id,
        role_id,
        image_id,
    };

    let url = format!("{}/stopped", state.config.role_selector_url);
    tracing::info!(
        service_id = %stopped.service_id,
        role_id = %stopped.role_id,
        "container died, notifying role selector"
    );

    if let Err(err) = state.http.put(&url).json(&stopped).send().await {
        tracing::warn!(error = %err, url = %url, "failed to notify role selector of stopped container");
    }
}
