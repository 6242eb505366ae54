use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::parser::MalformedKpi;

/// §7 error taxonomy, restricted to what can surface at the HTTP boundary.
/// `KpiFetchFailed` and the adapter-layer errors are handled and logged
/// internally by the selector loop — they never reach an ingress handler.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("malformed request body: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    MalformedKpi(#[from] MalformedKpi),

    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

pub type SelectorResult<T> = Result<T, SelectorError>;

impl IntoResponse for SelectorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SelectorError::MalformedInput(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            SelectorError::MalformedKpi(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SelectorError::Config(err) => {
                tracing::error!(error = %err, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
