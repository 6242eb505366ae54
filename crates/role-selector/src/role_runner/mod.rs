//! Role Runner — §4.5. Reaches a node's deployment manager to start/stop
//! role containers. Object-safe trait so the selector's core loop can be
//! driven by an in-memory fake in tests.
//!
//! `live.rs` is the real `reqwest`-backed implementation; `fake.rs` (test
//! only) records calls for assertion.

mod live;

use std::future::Future;
use std::pin::Pin;

pub use live::HttpRoleRunner;

#[cfg(test)]
mod fake;
#[cfg(test)]
pub use fake::{FakeRoleRunner, RunnerCall};

/// Fire-and-forget start/stop of a role's container on a node's deployment
/// manager. Implementations must be `Send + Sync` to live behind the
/// selector's `Arc<dyn RoleRunner>`.
pub trait RoleRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    fn stop<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
        remove: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}
