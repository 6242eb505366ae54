//! `FakeRoleRunner` — in-memory test double that records every `run`/`stop`
//! call for assertion, instead of reaching a deployment manager over HTTP.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use super::RoleRunner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Run {
        service_id: String,
        role_id: String,
        image_id: String,
    },
    Stop {
        service_id: String,
        role_id: String,
        image_id: String,
        remove: bool,
    },
}

#[derive(Default)]
pub struct FakeRoleRunner {
    calls: Mutex<Vec<RunnerCall>>,
}

impl FakeRoleRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call recorded so far, in call order.
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RoleRunner for FakeRoleRunner {
    fn run<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RunnerCall::Run {
                service_id: service_id.to_string(),
                role_id: role_id.to_string(),
                image_id: image_id.to_string(),
            });
        })
    }

    fn stop<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
        remove: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RunnerCall::Stop {
                service_id: service_id.to_string(),
                role_id: role_id.to_string(),
                image_id: image_id.to_string(),
                remove,
            });
        })
    }
}
