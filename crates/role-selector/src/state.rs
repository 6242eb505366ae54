use std::sync::Arc;

use tokio::sync::mpsc;

use crate::types::{Alert, ServiceDescription, StoppedEvent};

/// Senders into the selector loop's event channels. Ingress handlers
/// never touch `rolesByService` directly — only the loop does.
pub struct RoleSelectorState {
    pub service_description_tx: mpsc::Sender<ServiceDescription>,
    pub alert_tx: mpsc::Sender<Alert>,
    pub stopped_tx: mpsc::Sender<StoppedEvent>,
}

pub type SharedState = Arc<RoleSelectorState>;
