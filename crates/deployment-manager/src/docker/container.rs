//! Container domain — idempotent run/stop of role containers.

use std::collections::HashMap;
use std::time::Duration;

use bollard::models::HostConfig;
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};

use super::client::{canonical_container_name, DockerClient, DockerError};

pub const LABEL_ROLE_ID: &str = "es.bsc.colmena.roleId";
pub const LABEL_SERVICE_ID: &str = "es.bsc.colmena.serviceId";
pub const LABEL_IMAGE_ID: &str = "es.bsc.colmena.imageId";

/// Parameters needed to run a role's container, mirroring §4.6 of the
/// container-engine-adapter contract.
pub struct RunSpec<'a> {
    pub service_id: &'a str,
    pub role_id: &'a str,
    pub image_id: &'a str,
    pub agent_id: &'a str,
    pub peer_discovery_interface: &'a str,
    pub image_pull_timeout: Duration,
}

impl DockerClient {
    async fn container_exists(&self, name: &str) -> Result<bool, DockerError> {
        match self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(false)
            }
            Err(e) => Err(DockerError::from(e)),
        }
    }

    /// Idempotently run the container for a role: ensure the image is
    /// present, create the container if it doesn't exist yet, and start it.
    pub async fn run_container(&self, spec: RunSpec<'_>) -> Result<(), DockerError> {
        self.ensure_image_present(spec.image_id, spec.image_pull_timeout)
            .await?;

        let name = canonical_container_name(spec.image_id);

        if !self.container_exists(&name).await? {
            let mut labels = HashMap::new();
            labels.insert(LABEL_ROLE_ID.to_string(), spec.role_id.to_string());
            labels.insert(LABEL_SERVICE_ID.to_string(), spec.service_id.to_string());
            labels.insert(LABEL_IMAGE_ID.to_string(), spec.image_id.to_string());

            let env = vec![
                format!("PEER_DISCOVERY_INTERFACE={}", spec.peer_discovery_interface),
                format!("HOSTNAME={}", spec.agent_id),
                format!("AGENT_ID={}", spec.agent_id),
            ];

            let host_config = HostConfig {
                network_mode: Some("host".to_string()),
                binds: Some(vec![
                    "/tmp:/tmp".to_string(),
                    "/var/run/docker.sock:/var/run/docker.sock".to_string(),
                ]),
                ..Default::default()
            };

            let config = bollard::models::ContainerCreateBody {
                image: Some(spec.image_id.to_string()),
                labels: Some(labels),
                env: Some(env),
                host_config: Some(host_config),
                ..Default::default()
            };

            let options = CreateContainerOptionsBuilder::default().name(&name).build();

            self.client
                .create_container(Some(options), config)
                .await
                .map_err(|e| DockerError::ContainerCreateFailed(e.to_string()))?;
        }

        self.client
            .start_container(&name, None::<StartContainerOptions>)
            .await
            .map_err(|e| DockerError::ContainerCreateFailed(e.to_string()))?;

        Ok(())
    }

    /// Stop the canonical container for `image_id`. `remove` force-removes
    /// including volumes. A container that is already absent is treated as
    /// success (idempotent stop).
    pub async fn stop_container(&self, image_id: &str, remove: bool) -> Result<(), DockerError> {
        let name = canonical_container_name(image_id);

        match self
            .client
            .stop_container(&name, None::<StopContainerOptions>)
            .await
        {
            Ok(()) => {}
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                return Ok(());
            }
            Err(e) => return Err(DockerError::ContainerStopFailed(e.to_string())),
        }

        if remove {
            let options = RemoveContainerOptions {
                force: true,
                v: true,
                ..Default::default()
            };
            match self.client.remove_container(&name, Some(options)).await {
                Ok(())
                | Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                }) => {}
                Err(e) => return Err(DockerError::ContainerStopFailed(e.to_string())),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_colmena_namespace() {
        assert_eq!(LABEL_ROLE_ID, "es.bsc.colmena.roleId");
        assert_eq!(LABEL_SERVICE_ID, "es.bsc.colmena.serviceId");
        assert_eq!(LABEL_IMAGE_ID, "es.bsc.colmena.imageId");
    }
}
