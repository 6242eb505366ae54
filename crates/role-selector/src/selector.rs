//! Role Selector core loop — §4.7. Single-owner event loop multiplexing
//! service descriptions, alerts, stopped-container notifications, and a
//! periodic tick; owns `rolesByService` under one lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};

use crate::kpi_retriever::KpiRetriever;
use crate::parser;
use crate::policy::Policy;
use crate::reconcile::reconcile;
use crate::role_runner::RoleRunner;
use crate::types::{
    Alert, Decision, HardwareTag, Kpi, Resources, Role, RoleState, ServiceDescription, ServiceId,
    StoppedEvent,
};

pub struct Selector {
    roles: Mutex<HashMap<ServiceId, Vec<Role>>>,
    hardware: HardwareTag,
    policy: Policy,
    runner: Arc<dyn RoleRunner>,
    kpi_retriever: KpiRetriever,
    tick_interval: Duration,
    /// §9 open question: the source alternates between enabling and
    /// disabling periodic `checkRoles`. Exposed as a flag rather than
    /// compiled in one way or the other.
    tick_enabled: bool,
}

impl Selector {
    pub fn new(
        hardware: HardwareTag,
        policy: Policy,
        runner: Arc<dyn RoleRunner>,
        kpi_retriever: KpiRetriever,
        tick_interval: Duration,
        tick_enabled: bool,
    ) -> Self {
        Self {
            roles: Mutex::new(HashMap::new()),
            hardware,
            policy,
            runner,
            kpi_retriever,
            tick_interval,
            tick_enabled,
        }
    }

    /// Snapshot of the current role state, used by tests and diagnostics.
    /// Callers hold no reference into selector state — this is a copy.
    pub async fn snapshot(&self, service_id: &str) -> Option<Vec<Role>> {
        self.roles.lock().await.get(service_id).cloned()
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub async fn run(
        self: std::sync::Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
        mut service_description_rx: mpsc::Receiver<ServiceDescription>,
        mut alert_rx: mpsc::Receiver<Alert>,
        mut stopped_rx: mpsc::Receiver<StoppedEvent>,
        mut decision_rx: mpsc::Receiver<Decision>,
    ) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick fires immediately; discard it

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.policy.stop().await;
                        break;
                    }
                }
                Some(desc) = service_description_rx.recv() => {
                    self.handle_service_description(desc).await;
                }
                Some(alert) = alert_rx.recv() => {
                    self.handle_alert(alert).await;
                }
                Some(event) = stopped_rx.recv() => {
                    self.handle_stopped_event(event).await;
                }
                Some(decision) = decision_rx.recv() => {
                    self.trigger_decision(decision).await;
                }
                _ = ticker.tick() => {
                    self.handle_tick().await;
                }
            }
        }
    }

    pub async fn handle_service_description(&self, description: ServiceDescription) {
        let parsed = match parser::parse(&description, &self.hardware) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(
                    service_id = %description.service_id,
                    error = %err,
                    "malformed service description; ignoring"
                );
                return;
            }
        };

        if parsed.eligible_roles.is_empty() {
            tracing::info!(
                service_id = %description.service_id,
                "no eligible roles for this node; ignoring"
            );
            return;
        }

        let mut new_roles: Vec<Role> = parsed
            .eligible_roles
            .iter()
            .map(|role| Role {
                service_id: description.service_id.clone(),
                role_id: role.role_id.clone(),
                image_id: role.image_id.clone(),
                resources: Resources::default(),
                state: RoleState::Stopped,
                kpis: role.kpis.clone(),
            })
            .collect();

        {
            let mut roles = self.roles.lock().await;
            if let Some(old) = roles.get_mut(&description.service_id) {
                reconcile(&description.service_id, old, &mut new_roles, self.runner.as_ref()).await;
            }
            roles.insert(description.service_id.clone(), new_roles);
        }

        self.check_roles(&description.service_id).await;
    }

    pub async fn handle_alert(&self, alert: Alert) {
        let tracked = {
            let roles = self.roles.lock().await;
            roles.contains_key(&alert.service_id)
        };
        if !tracked {
            tracing::debug!(service_id = %alert.service_id, "alert for untracked service; ignoring");
            return;
        }

        let kpis: Vec<Kpi> = alert.kpis.into_iter().map(Kpi::from).collect();
        self.decide_and_execute(&alert.service_id, &kpis).await;
    }

    pub async fn handle_stopped_event(&self, event: StoppedEvent) {
        let mut needs_check_roles = false;
        {
            let mut roles = self.roles.lock().await;
            let Some(list) = roles.get_mut(&event.service_id) else {
                tracing::warn!(
                    service_id = %event.service_id,
                    role_id = %event.role_id,
                    "stopped event for unknown service; ignoring"
                );
                return;
            };
            let Some(role) = list.iter_mut().find(|r| r.role_id == event.role_id) else {
                tracing::warn!(
                    service_id = %event.service_id,
                    role_id = %event.role_id,
                    "stopped event for unknown role; ignoring"
                );
                return;
            };

            match role.state {
                RoleState::Updating => {
                    role.state = RoleState::Stopped;
                    needs_check_roles = true;
                }
                RoleState::Running => role.state = RoleState::Stopped,
                RoleState::Stopped => {
                    tracing::info!(
                        service_id = %event.service_id,
                        role_id = %event.role_id,
                        "stopped event for an already-stopped role"
                    );
                }
                RoleState::Unknown => {
                    tracing::warn!(
                        service_id = %event.service_id,
                        role_id = %event.role_id,
                        "stopped event for role in unknown state"
                    );
                    role.state = RoleState::Stopped;
                }
            }
        }

        if needs_check_roles {
            self.check_roles(&event.service_id).await;
        }
    }

    pub async fn handle_tick(&self) {
        if !self.tick_enabled {
            return;
        }
        let service_ids: Vec<ServiceId> = {
            let roles = self.roles.lock().await;
            roles.keys().cloned().collect()
        };
        for service_id in service_ids {
            self.check_roles(&service_id).await;
        }
    }

    /// Asynchronous policy callback (§4.7.3). The only path by which an
    /// out-of-band decision mutates selector state.
    pub async fn trigger_decision(&self, decision: Decision) {
        let mut roles = self.roles.lock().await;
        let role = roles
            .get_mut(&decision.service_id)
            .and_then(|list| list.iter_mut().find(|r| r.role_id == decision.role_id));

        match role {
            Some(role) => {
                Self::execute_decision(role, decision.start_or_stop, &self.runner, &decision.service_id).await;
            }
            None => {
                tracing::warn!(
                    service_id = %decision.service_id,
                    role_id = %decision.role_id,
                    "TriggerDecision for unknown role; ignoring"
                );
            }
        }
    }

    /// §4.7, Event: Tick / post-ServiceDescription check. The mandatory
    /// pass (§4.7.1 step 1) runs unconditionally — a KPI-less role must
    /// always start regardless of whether the SLA manager is reachable.
    /// Only the policy cycle over KPI-having roles is skipped on
    /// `KpiFetchFailed`, per §7.
    async fn check_roles(&self, service_id: &str) {
        self.run_mandatory_pass(service_id).await;

        match self.kpi_retriever.get(service_id).await {
            Ok(kpis) => self.apply_policy_decisions(service_id, &kpis).await,
            Err(err) => {
                tracing::warn!(service_id, error = %err, "kpi fetch failed; skipping policy cycle");
            }
        }
    }

    /// §4.7.1. Mandatory pass (KPI-less roles always run) followed by the
    /// configured policy over the remaining, non-`Updating` roles. Used by
    /// the Alert handler, where KPIs are supplied directly and there is no
    /// separate fetch step to fail.
    async fn decide_and_execute(&self, service_id: &str, kpis: &[Kpi]) {
        self.run_mandatory_pass(service_id).await;
        self.apply_policy_decisions(service_id, kpis).await;
    }

    /// §4.7.1 step 1: roles with an empty `kpis` list always run. This
    /// makes KPI-less roles independent of KPI availability entirely —
    /// it must not be gated behind a successful KPI fetch.
    async fn run_mandatory_pass(&self, service_id: &str) {
        let mut roles = self.roles.lock().await;
        let Some(list) = roles.get_mut(service_id) else {
            return;
        };

        for role in list.iter_mut() {
            if role.state != RoleState::Updating && role.kpis.is_empty() {
                Self::execute_decision(role, true, &self.runner, service_id).await;
            }
        }
    }

    /// §4.7.1 step 2: the configured policy over non-`Updating` roles that
    /// do carry KPIs.
    async fn apply_policy_decisions(&self, service_id: &str, kpis: &[Kpi]) {
        let mut roles = self.roles.lock().await;
        let Some(list) = roles.get_mut(service_id) else {
            return;
        };

        let remaining: Vec<Role> = list
            .iter()
            .filter(|r| r.state != RoleState::Updating && !r.kpis.is_empty())
            .cloned()
            .collect();

        if remaining.is_empty() {
            return;
        }

        let decisions = self.policy.decide(&remaining, kpis).await;
        if decisions.is_empty() {
            return;
        }

        for role in list.iter_mut() {
            if role.state == RoleState::Updating {
                continue;
            }
            if let Some(&start) = decisions.get(&role.role_id) {
                Self::execute_decision(role, start, &self.runner, service_id).await;
            }
        }
    }

    /// §4.7.2. `Updating` is never transitioned out of here — only by a
    /// StoppedEvent.
    async fn execute_decision(role: &mut Role, start: bool, runner: &Arc<dyn RoleRunner>, service_id: &str) {
        match (start, role.state) {
            (true, RoleState::Stopped) => {
                runner.run(service_id, &role.role_id, &role.image_id).await;
                role.state = RoleState::Running;
            }
            (false, RoleState::Running) => {
                runner.stop(service_id, &role.role_id, &role.image_id, false).await;
                role.state = RoleState::Stopped;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role_runner::{FakeRoleRunner, RunnerCall};
    use crate::types::{AlertKpi, KpiDescription, KpiLevel, RoleDescription};

    /// Builds a selector wired to a `FakeRoleRunner`, returning both so
    /// tests can assert on the exact sequence of `Run`/`Stop` calls.
    fn selector(policy: Policy) -> (Selector, Arc<FakeRoleRunner>) {
        let runner = Arc::new(FakeRoleRunner::new());
        let dyn_runner: Arc<dyn RoleRunner> = runner.clone();
        let selector = Selector::new(
            HardwareTag::new("SENSOR"),
            policy,
            dyn_runner,
            KpiRetriever::new("http://localhost:8081"),
            Duration::from_secs(3600),
            false,
        );
        (selector, runner)
    }

    fn description(service_id: &str, role_id: &str, image_id: &str, hw: &str) -> ServiceDescription {
        ServiceDescription {
            service_id: service_id.to_string(),
            kpis: vec![],
            role_definitions: vec![RoleDescription {
                role_id: role_id.to_string(),
                image_id: image_id.to_string(),
                hardware_requirements: vec![hw.to_string()],
                kpis: vec![],
            }],
        }
    }

    fn alert_kpi(query: &str, value: f64, role_id: &str, level: KpiLevel) -> AlertKpi {
        AlertKpi {
            query: query.to_string(),
            value,
            associated_role: role_id.to_string(),
            level,
        }
    }

    /// S3 / testable property #5: a KPI-less role must start even though
    /// the SLA manager (`KpiRetriever`, pointed at a dead endpoint here) is
    /// unreachable. Regression test for the mandatory pass previously being
    /// gated behind a successful KPI fetch.
    #[tokio::test]
    async fn mandatory_role_starts_immediately() {
        let (selector, runner) = selector(Policy::Lazy);
        let desc = description("exampleservice", "sensing", "sensing:latest", "SENSOR");

        selector.handle_service_description(desc).await;

        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, RoleState::Running);
        assert_eq!(
            runner.calls(),
            vec![RunnerCall::Run {
                service_id: "exampleservice".to_string(),
                role_id: "sensing".to_string(),
                image_id: "sensing:latest".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn ineligible_role_never_appears_in_state() {
        let (selector, _runner) = selector(Policy::Eager);
        let desc = description("exampleservice", "camera", "cam:latest", "CAMERA");

        selector.handle_service_description(desc).await;

        assert!(selector.snapshot("exampleservice").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_stopped_event_is_a_no_op() {
        let (selector, _runner) = selector(Policy::Lazy);
        let desc = description("exampleservice", "sensing", "sensing:latest", "SENSOR");
        selector.handle_service_description(desc).await;

        let stop = StoppedEvent {
            service_id: "exampleservice".to_string(),
            role_id: "sensing".to_string(),
            image_id: "sensing:latest".to_string(),
        };
        selector.handle_stopped_event(stop.clone()).await;
        let after_first = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(after_first[0].state, RoleState::Stopped);

        selector.handle_stopped_event(stop).await;
        let after_second = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(after_second[0].state, RoleState::Stopped);
    }

    #[tokio::test]
    async fn lazy_role_with_kpi_does_not_start_without_an_alert() {
        let mut desc = description("exampleservice", "processing", "processing:latest", "SENSOR");
        desc.role_definitions[0].kpis.push(KpiDescription {
            query: "processing_time < 15".to_string(),
            scope: "role".to_string(),
        });

        let (selector, runner) = selector(Policy::Lazy);
        selector.handle_service_description(desc).await;

        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Stopped);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn trigger_decision_starts_a_stopped_role() {
        let mut desc = description("exampleservice", "processing", "processing:latest", "SENSOR");
        desc.role_definitions[0].kpis.push(KpiDescription {
            query: "processing_time < 15".to_string(),
            scope: "role".to_string(),
        });

        let (selector, runner) = selector(Policy::Lazy);
        selector.handle_service_description(desc).await;

        selector
            .trigger_decision(Decision {
                service_id: "exampleservice".to_string(),
                role_id: "processing".to_string(),
                start_or_stop: true,
            })
            .await;

        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Running);
        assert_eq!(
            runner.calls(),
            vec![RunnerCall::Run {
                service_id: "exampleservice".to_string(),
                role_id: "processing".to_string(),
                image_id: "processing:latest".to_string(),
            }]
        );
    }

    /// S1: posting a `ServiceDescription` with a single eligible, KPI-less
    /// role yields exactly one `Run` — never a double-start from both the
    /// mandatory pass and a later tick.
    #[tokio::test]
    async fn eager_start_produces_exactly_one_run() {
        let (selector, runner) = selector(Policy::Eager);
        let desc = description("exampleservice", "sensing", "sensing:latest", "SENSOR");

        selector.handle_service_description(desc).await;

        assert_eq!(
            runner.calls(),
            vec![RunnerCall::Run {
                service_id: "exampleservice".to_string(),
                role_id: "sensing".to_string(),
                image_id: "sensing:latest".to_string(),
            }]
        );
    }

    /// S4, the rolling-update path: a running role's image changes, the old
    /// container is stopped and both sides move to `Updating`, and only
    /// once the `StoppedEvent` for the old container arrives does the new
    /// image start — never two versions running concurrently.
    #[tokio::test]
    async fn rolling_update_stops_old_image_before_starting_new_one() {
        let (selector, runner) = selector(Policy::Eager);

        let first = description("exampleservice", "sensing", "sensing:latest", "SENSOR");
        selector.handle_service_description(first).await;
        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Running);

        let second = description("exampleservice", "sensing", "sensing:latest2", "SENSOR");
        selector.handle_service_description(second).await;
        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Updating);
        assert_eq!(snapshot[0].image_id, "sensing:latest2");

        selector
            .handle_stopped_event(StoppedEvent {
                service_id: "exampleservice".to_string(),
                role_id: "sensing".to_string(),
                image_id: "sensing:latest".to_string(),
            })
            .await;

        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Running);
        assert_eq!(snapshot[0].image_id, "sensing:latest2");

        assert_eq!(
            runner.calls(),
            vec![
                RunnerCall::Run {
                    service_id: "exampleservice".to_string(),
                    role_id: "sensing".to_string(),
                    image_id: "sensing:latest".to_string(),
                },
                RunnerCall::Stop {
                    service_id: "exampleservice".to_string(),
                    role_id: "sensing".to_string(),
                    image_id: "sensing:latest".to_string(),
                    remove: true,
                },
                RunnerCall::Run {
                    service_id: "exampleservice".to_string(),
                    role_id: "sensing".to_string(),
                    image_id: "sensing:latest2".to_string(),
                },
            ]
        );
    }

    /// S5: a `Broken` alert starts a KPI-having role under the Lazy policy,
    /// and a later `Met` alert stops it again.
    #[tokio::test]
    async fn alert_starts_and_stops_a_kpi_having_role_under_lazy() {
        let mut desc = description("exampleservice", "processing", "processing:latest", "SENSOR");
        desc.role_definitions[0].kpis.push(KpiDescription {
            query: "processing_time < 15".to_string(),
            scope: "role".to_string(),
        });

        let (selector, runner) = selector(Policy::Lazy);
        selector.handle_service_description(desc).await;
        assert!(runner.calls().is_empty());

        selector
            .handle_alert(Alert {
                service_id: "exampleservice".to_string(),
                sla_id: "sla-1".to_string(),
                kpis: vec![alert_kpi("processing_time < 15", 20.0, "processing", KpiLevel::Broken)],
            })
            .await;
        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Running);

        selector
            .handle_alert(Alert {
                service_id: "exampleservice".to_string(),
                sla_id: "sla-1".to_string(),
                kpis: vec![alert_kpi("processing_time < 15", 5.0, "processing", KpiLevel::Met)],
            })
            .await;
        let snapshot = selector.snapshot("exampleservice").await.unwrap();
        assert_eq!(snapshot[0].state, RoleState::Stopped);

        assert_eq!(
            runner.calls(),
            vec![
                RunnerCall::Run {
                    service_id: "exampleservice".to_string(),
                    role_id: "processing".to_string(),
                    image_id: "processing:latest".to_string(),
                },
                RunnerCall::Stop {
                    service_id: "exampleservice".to_string(),
                    role_id: "processing".to_string(),
                    image_id: "processing:latest".to_string(),
                    remove: false,
                },
            ]
        );
    }
}
