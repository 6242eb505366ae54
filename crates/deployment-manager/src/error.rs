use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::docker::DockerError;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("malformed request body: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Docker(#[from] DockerError),

    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

pub type DeploymentResult<T> = Result<T, DeploymentError>;

impl IntoResponse for DeploymentError {
    /// §7: every adapter-layer error is logged and returned to the caller
    /// as 500; malformed requests are 400. The selector does not retry
    /// either class — it records intent and lets the next event correct it.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DeploymentError::MalformedInput(detail) => {
                (StatusCode::BAD_REQUEST, detail.clone())
            }
            DeploymentError::Docker(err) => {
                tracing::error!(error = %err, "container engine adapter failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            DeploymentError::Config(err) => {
                tracing::error!(error = %err, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration error".to_string())
            }
        };

        (status, message).into_response()
    }
}
