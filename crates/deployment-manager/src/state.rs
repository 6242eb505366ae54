use std::sync::Arc;

use crate::config::DeploymentManagerConfig;
use crate::docker::DockerClient;

pub type SharedState = Arc<DeploymentManagerState>;

pub struct DeploymentManagerState {
    pub docker: DockerClient,
    pub config: DeploymentManagerConfig,
    pub http: reqwest::Client,
}

impl DeploymentManagerState {
    pub fn new(docker: DockerClient, config: DeploymentManagerConfig) -> SharedState {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("reqwest client builder failed");

        Arc::new(Self {
            docker,
            config,
            http,
        })
    }
}
