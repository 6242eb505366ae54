//! Policy — §4.2, §9. Tagged variants rather than a trait object: the
//! capability surface is small (decide/mode/name/stop) and the
//! asynchronous variant's return path (a callback, not a return value)
//! doesn't fit a shared `decide` signature cleanly as a trait.

pub mod consensus;
pub mod eager;
pub mod lazy;

use std::collections::HashMap;

pub use consensus::ConsensusPolicy;

use crate::types::{Kpi, Role, RoleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Synchronous,
    Asynchronous,
}

pub enum Policy {
    Eager,
    Lazy,
    Consensus(ConsensusPolicy),
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Eager => "eager",
            Policy::Lazy => "lazy",
            Policy::Consensus(_) => "consensus",
        }
    }

    pub fn mode(&self) -> PolicyMode {
        match self {
            Policy::Eager | Policy::Lazy => PolicyMode::Synchronous,
            Policy::Consensus(_) => PolicyMode::Asynchronous,
        }
    }

    /// Returns a partial mapping: a roleId may be absent (no opinion).
    /// Asynchronous variants only ever populate the synchronous subset of
    /// their decisions here — later starts arrive via `TriggerDecision`.
    pub async fn decide(&self, roles: &[Role], kpis: &[Kpi]) -> HashMap<RoleId, bool> {
        match self {
            Policy::Eager => eager::decide(roles),
            Policy::Lazy => lazy::decide(roles, kpis),
            Policy::Consensus(policy) => policy.decide(roles, kpis).await,
        }
    }

    pub async fn stop(&self) {
        if let Policy::Consensus(policy) = self {
            policy.stop().await;
        }
    }
}
