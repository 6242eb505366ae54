//! Update Reconciler — §4.3. Decides stop-before-start semantics for
//! rolling updates between an existing role set and a freshly parsed one.

use crate::role_runner::RoleRunner;
use crate::types::{Role, RoleState};

/// Reconcile `old` (the role set currently tracked by the selector) against
/// `new` (freshly parsed from a `ServiceDescription`). Mutates both in
/// place: `old` entries that must stop transition to `Stopped`/`Updating`,
/// and the matching `new` entry is marked `Updating` on an image change so
/// the Policy never starts two versions of the same role concurrently.
pub async fn reconcile(service_id: &str, old: &mut [Role], new: &mut [Role], runner: &dyn RoleRunner) {
    for o in old.iter_mut() {
        if o.state != RoleState::Running {
            continue;
        }

        match new.iter_mut().find(|n| n.role_id == o.role_id) {
            None => {
                runner.stop(service_id, &o.role_id, &o.image_id, true).await;
                o.state = RoleState::Stopped;
            }
            Some(n) if n.image_id == o.image_id => {
                // Unchanged: carry the running state forward onto the freshly
                // parsed role so the selector doesn't re-start it.
                n.state = o.state;
            }
            Some(n) => {
                runner.stop(service_id, &o.role_id, &o.image_id, true).await;
                o.state = RoleState::Updating;
                n.state = RoleState::Updating;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role_runner::{FakeRoleRunner, RunnerCall};
    use crate::types::Resources;

    fn role(id: &str, image: &str, state: RoleState) -> Role {
        Role {
            service_id: "svc".to_string(),
            role_id: id.to_string(),
            image_id: image.to_string(),
            resources: Resources::default(),
            state,
            kpis: vec![],
        }
    }

    #[tokio::test]
    async fn unchanged_image_carries_running_state_forward() {
        let runner = FakeRoleRunner::new();
        let mut old = vec![role("sensing", "sensing:latest", RoleState::Running)];
        let mut new = vec![role("sensing", "sensing:latest", RoleState::Stopped)];

        reconcile("svc", &mut old, &mut new, &runner).await;

        assert_eq!(old[0].state, RoleState::Running);
        assert_eq!(new[0].state, RoleState::Running);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn image_change_moves_both_sides_to_updating() {
        let runner = FakeRoleRunner::new();
        let mut old = vec![role("sensing", "sensing:latest", RoleState::Running)];
        let mut new = vec![role("sensing", "sensing:latest2", RoleState::Stopped)];

        reconcile("svc", &mut old, &mut new, &runner).await;

        assert_eq!(old[0].state, RoleState::Updating);
        assert_eq!(new[0].state, RoleState::Updating);
        assert_eq!(
            runner.calls(),
            vec![RunnerCall::Stop {
                service_id: "svc".to_string(),
                role_id: "sensing".to_string(),
                image_id: "sensing:latest".to_string(),
                remove: true,
            }]
        );
    }

    #[tokio::test]
    async fn role_absent_from_new_set_is_stopped() {
        let runner = FakeRoleRunner::new();
        let mut old = vec![role("sensing", "sensing:latest", RoleState::Running)];
        let mut new: Vec<Role> = vec![];

        reconcile("svc", &mut old, &mut new, &runner).await;

        assert_eq!(old[0].state, RoleState::Stopped);
        assert_eq!(
            runner.calls(),
            vec![RunnerCall::Stop {
                service_id: "svc".to_string(),
                role_id: "sensing".to_string(),
                image_id: "sensing:latest".to_string(),
                remove: true,
            }]
        );
    }

    #[tokio::test]
    async fn non_running_roles_are_left_alone() {
        let runner = FakeRoleRunner::new();
        let mut old = vec![role("sensing", "sensing:latest", RoleState::Stopped)];
        let mut new = vec![role("sensing", "sensing:latest2", RoleState::Stopped)];

        reconcile("svc", &mut old, &mut new, &runner).await;

        assert_eq!(old[0].state, RoleState::Stopped);
        assert_eq!(new[0].state, RoleState::Stopped);
        assert!(runner.calls().is_empty());
    }
}
