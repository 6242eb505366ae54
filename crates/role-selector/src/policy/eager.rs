//! Eager policy — §4.2. Always runs every candidate role. Synchronous.

use std::collections::HashMap;

use crate::types::{Role, RoleId};

pub fn decide(roles: &[Role]) -> HashMap<RoleId, bool> {
    roles.iter().map(|r| (r.role_id.clone(), true)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Resources, RoleState};

    fn role(id: &str) -> Role {
        Role {
            service_id: "svc".to_string(),
            role_id: id.to_string(),
            image_id: "img:latest".to_string(),
            resources: Resources::default(),
            state: RoleState::Stopped,
            kpis: vec![],
        }
    }

    #[test]
    fn always_true_for_every_role() {
        let roles = vec![role("sensing"), role("processing")];
        let decisions = decide(&roles);
        assert_eq!(decisions.get("sensing"), Some(&true));
        assert_eq!(decisions.get("processing"), Some(&true));
    }

    #[test]
    fn empty_roles_yield_empty_decisions() {
        assert!(decide(&[]).is_empty());
    }
}
