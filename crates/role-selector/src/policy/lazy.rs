//! Lazy policy — §4.2. Runs a role only while an associated KPI is
//! Broken/Critical, otherwise preserves current intent. Synchronous.

use std::collections::HashMap;

use crate::types::{Kpi, KpiLevel, Role, RoleId, RoleState};

pub fn decide(roles: &[Role], kpis: &[Kpi]) -> HashMap<RoleId, bool> {
    let mut decisions: HashMap<RoleId, bool> = roles
        .iter()
        .map(|r| {
            let running = matches!(r.state, RoleState::Running | RoleState::Updating);
            (r.role_id.clone(), running)
        })
        .collect();

    // Later KPIs override earlier ones for the same role — last-wins,
    // per the open question on KPI ordering.
    for kpi in kpis {
        if kpi.associated_role.is_empty() {
            continue;
        }
        let broken = matches!(kpi.level, KpiLevel::Broken | KpiLevel::Critical);
        decisions.insert(kpi.associated_role.clone(), broken);
    }

    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operator, Resources};

    fn role(id: &str, state: RoleState) -> Role {
        Role {
            service_id: "svc".to_string(),
            role_id: id.to_string(),
            image_id: "img:latest".to_string(),
            resources: Resources::default(),
            state,
            kpis: vec![],
        }
    }

    fn kpi(role_id: &str, level: KpiLevel) -> Kpi {
        Kpi {
            query: "processing_time < 15".to_string(),
            value: 1.0,
            threshold: 15.0,
            operator: Operator::LessThan,
            associated_role: role_id.to_string(),
            level,
        }
    }

    #[test]
    fn broken_kpi_starts_a_stopped_role() {
        let roles = vec![role("processing", RoleState::Stopped)];
        let kpis = vec![kpi("processing", KpiLevel::Broken)];
        assert_eq!(decide(&roles, &kpis).get("processing"), Some(&true));
    }

    #[test]
    fn met_kpi_stops_a_running_role() {
        let roles = vec![role("processing", RoleState::Running)];
        let kpis = vec![kpi("processing", KpiLevel::Met)];
        assert_eq!(decide(&roles, &kpis).get("processing"), Some(&false));
    }

    #[test]
    fn no_associated_kpi_preserves_current_intent() {
        let roles = vec![role("processing", RoleState::Running)];
        assert_eq!(decide(&roles, &[]).get("processing"), Some(&true));

        let roles = vec![role("processing", RoleState::Stopped)];
        assert_eq!(decide(&roles, &[]).get("processing"), Some(&false));
    }

    #[test]
    fn later_kpi_wins_when_two_disagree_for_the_same_role() {
        let roles = vec![role("processing", RoleState::Stopped)];
        let kpis = vec![
            kpi("processing", KpiLevel::Broken),
            kpi("processing", KpiLevel::Met),
        ];
        assert_eq!(decide(&roles, &kpis).get("processing"), Some(&false));
    }

    #[test]
    fn unassociated_kpi_is_ignored() {
        let roles = vec![role("processing", RoleState::Stopped)];
        let kpis = vec![kpi("", KpiLevel::Broken)];
        assert_eq!(decide(&roles, &kpis).get("processing"), Some(&false));
    }
}
