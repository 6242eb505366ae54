//! Image domain — presence check, pull, bounded wait for pull completion.

use std::time::Duration;

use futures_util::stream::StreamExt;
use tokio::time::Instant;

use super::client::{DockerClient, DockerError};

impl DockerClient {
    /// True if `image_id` already appears in the local image list.
    pub async fn image_present(&self, image_id: &str) -> Result<bool, DockerError> {
        use bollard::query_parameters::ListImagesOptions;

        let options = Some(ListImagesOptions {
            all: false,
            ..Default::default()
        });

        let images = self.client.list_images(options).await?;
        Ok(images
            .iter()
            .any(|summary| summary.repo_tags.iter().any(|t| t == image_id)))
    }

    /// Request a pull of `image_id` from its registry. Does not wait for the
    /// image to become locally visible — callers use `ensure_image_present`
    /// for that.
    async fn request_pull(&self, image_id: &str) -> Result<(), DockerError> {
        use bollard::query_parameters::CreateImageOptions;

        let options = Some(CreateImageOptions {
            from_image: Some(image_id.to_string()),
            ..Default::default()
        });

        let mut stream = self.client.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => tracing::debug!(status = ?info.status, image_id, "image pull progress"),
                Err(e) => return Err(DockerError::from(e)),
            }
        }

        Ok(())
    }

    /// Ensure `image_id` is present locally, pulling it if necessary and
    /// waiting (bounded by `timeout`) until it appears in the local image
    /// list. Fails with `ImagePullTimeout` if the image never shows up.
    pub async fn ensure_image_present(
        &self,
        image_id: &str,
        timeout: Duration,
    ) -> Result<(), DockerError> {
        if self.image_present(image_id).await? {
            return Ok(());
        }

        self.request_pull(image_id).await?;

        let deadline = Instant::now() + timeout;
        loop {
            if self.image_present(image_id).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DockerError::ImagePullTimeout(image_id.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}
