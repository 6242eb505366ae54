//! Consensus policy — §4.2, §9. Asynchronous. A Met/Warning KPI is still
//! resolved synchronously (stops happen immediately, same as Lazy); a
//! Broken/Critical KPI outside its cooldown window is batched into one
//! outbound `RequestRoles` RPC. Actual starts arrive later as inbound
//! `TriggerRole` callbacks, forwarded onto a channel the selector loop
//! owns — this policy never mutates role state directly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

use crate::types::{Decision, Kpi, KpiLevel, Role, RoleId};

mod proto {
    tonic::include_proto!("colmena");
}

pub use proto::scheduling_service_server::{SchedulingService, SchedulingServiceServer};
use proto::selection_service_client::SelectionServiceClient;
use proto::{RequestRolesRequest, TriggerRoleRequest, TriggerRoleResponse};

#[derive(Clone)]
pub struct ConsensusPolicy {
    endpoint: String,
    cooldown: Duration,
    last_request_at: Arc<Mutex<HashMap<RoleId, Instant>>>,
}

impl ConsensusPolicy {
    pub fn new(endpoint: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            cooldown,
            last_request_at: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn decide(&self, roles: &[Role], kpis: &[Kpi]) -> HashMap<RoleId, bool> {
        let (synchronous, requestable) = {
            let mut last_request_at = self.last_request_at.lock();
            synchronous_and_requestable(kpis, &mut last_request_at, self.cooldown)
        };

        if !requestable.is_empty() {
            if let Some(service_id) = roles.first().map(|r| r.service_id.clone()) {
                self.request_roles(service_id, requestable).await;
            }
        }

        synchronous
    }

    async fn request_roles(&self, service_id: String, role_ids: Vec<RoleId>) {
        let endpoint = Channel::from_shared(self.endpoint.clone()).ok();

        let channel = match endpoint {
            Some(endpoint) => endpoint.connect().await,
            None => {
                tracing::warn!(endpoint = %self.endpoint, "invalid consensus endpoint");
                return;
            }
        };

        let channel = match channel {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(endpoint = %self.endpoint, error = %err, "failed to reach consensus peer");
                return;
            }
        };

        let mut client = SelectionServiceClient::new(channel);
        let request = Request::new(RequestRolesRequest {
            service_id,
            role_ids,
        });
        if let Err(err) = client.request_roles(request).await {
            tracing::warn!(error = %err, "RequestRoles RPC failed");
        }
    }

    /// No persistent connections or background tasks of its own to tear
    /// down; the inbound server half is stopped by the selector's
    /// shutdown broadcast instead.
    pub async fn stop(&self) {}
}

/// Pure cooldown bookkeeping, split out of `decide` so it can be tested
/// without a live gRPC peer.
fn synchronous_and_requestable(
    kpis: &[Kpi],
    last_request_at: &mut HashMap<RoleId, Instant>,
    cooldown: Duration,
) -> (HashMap<RoleId, bool>, Vec<RoleId>) {
    let mut synchronous = HashMap::new();
    let mut met_or_warning = HashSet::new();

    for kpi in kpis {
        if kpi.associated_role.is_empty() {
            continue;
        }
        if matches!(kpi.level, KpiLevel::Met | KpiLevel::Warning) {
            synchronous.insert(kpi.associated_role.clone(), false);
            met_or_warning.insert(kpi.associated_role.clone());
        }
    }

    let now = Instant::now();
    let mut requestable = Vec::new();
    for kpi in kpis {
        if kpi.associated_role.is_empty() || met_or_warning.contains(&kpi.associated_role) {
            continue;
        }
        if !matches!(kpi.level, KpiLevel::Broken | KpiLevel::Critical) {
            continue;
        }
        let within_cooldown = last_request_at
            .get(&kpi.associated_role)
            .is_some_and(|t| now.duration_since(*t) < cooldown);
        if within_cooldown {
            continue;
        }
        last_request_at.insert(kpi.associated_role.clone(), now);
        requestable.push(kpi.associated_role.clone());
    }

    (synchronous, requestable)
}

/// Inbound `SchedulingService` implementation: forwards `TriggerRole`
/// callbacks onto the selector's decision channel rather than mutating
/// role state directly, keeping the gRPC transport layer ignorant of
/// `rolesByService`.
pub struct TriggerRoleService {
    decisions: mpsc::Sender<Decision>,
}

impl TriggerRoleService {
    pub fn new(decisions: mpsc::Sender<Decision>) -> Self {
        Self { decisions }
    }
}

#[tonic::async_trait]
impl SchedulingService for TriggerRoleService {
    async fn trigger_role(
        &self,
        request: Request<TriggerRoleRequest>,
    ) -> Result<Response<TriggerRoleResponse>, Status> {
        let req = request.into_inner();
        let decision = Decision {
            service_id: req.service_id,
            role_id: req.role_id,
            start_or_stop: req.start_or_stop,
        };
        let accepted = self.decisions.send(decision).await.is_ok();
        Ok(Response::new(TriggerRoleResponse { accepted }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;

    fn kpi(role_id: &str, level: KpiLevel) -> Kpi {
        Kpi {
            query: "processing_time > 15".to_string(),
            value: 30.0,
            threshold: 15.0,
            operator: Operator::GreaterThan,
            associated_role: role_id.to_string(),
            level,
        }
    }

    #[test]
    fn met_kpi_is_resolved_synchronously() {
        let mut last_request_at = HashMap::new();
        let (synchronous, requestable) = synchronous_and_requestable(
            &[kpi("processing", KpiLevel::Met)],
            &mut last_request_at,
            Duration::from_secs(600),
        );
        assert_eq!(synchronous.get("processing"), Some(&false));
        assert!(requestable.is_empty());
    }

    #[test]
    fn broken_kpi_outside_cooldown_is_requestable_once() {
        let mut last_request_at = HashMap::new();
        let cooldown = Duration::from_secs(600);

        let (_, first) = synchronous_and_requestable(
            &[kpi("processing", KpiLevel::Broken)],
            &mut last_request_at,
            cooldown,
        );
        assert_eq!(first, vec!["processing".to_string()]);

        let (_, second) = synchronous_and_requestable(
            &[kpi("processing", KpiLevel::Critical)],
            &mut last_request_at,
            cooldown,
        );
        assert!(second.is_empty(), "second request within cooldown must be suppressed");
    }

    #[test]
    fn unassociated_kpi_is_ignored() {
        let mut last_request_at = HashMap::new();
        let (synchronous, requestable) = synchronous_and_requestable(
            &[kpi("", KpiLevel::Broken)],
            &mut last_request_at,
            Duration::from_secs(600),
        );
        assert!(synchronous.is_empty());
        assert!(requestable.is_empty());
    }
}
