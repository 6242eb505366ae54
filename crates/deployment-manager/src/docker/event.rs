//! Event domain — Docker engine `die` events, filtered to container deaths.

use std::collections::HashMap;

use bollard::query_parameters::EventsOptionsBuilder;
use futures_util::stream::StreamExt;

use super::client::{DockerClient, DockerError};

impl DockerClient {
    /// Stream `die` events for containers. Non-`die` events are filtered
    /// out by the Docker daemon itself via the `event` filter.
    pub fn stream_die_events(
        &self,
    ) -> impl futures_util::Stream<Item = Result<bollard::models::EventMessage, DockerError>> + '_
    {
        let mut filters = HashMap::new();
        filters.insert("type", vec!["container"]);
        filters.insert("event", vec!["die"]);

        let options = EventsOptionsBuilder::default().filters(&filters).build();

        self.client
            .events(Some(options))
            .map(|r| r.map_err(DockerError::from))
    }
}
