use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure talking to an upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status. `body` holds its
    /// error payload when one was readable.
    #[error("upstream returned status {status}")]
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),

    #[error("upstream returned an empty result")]
    Empty,

    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// Upstream status to forward, if the upstream answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upstream error payload, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            UpstreamError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// Decode a JSON response, turning non-success statuses into
/// [`UpstreamError::Status`] with the upstream body attached.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| UpstreamError::Decode(e.to_string()))
}

pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = if text.is_empty() {
        None
    } else {
        Some(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    };

    tracing::warn!(status = status.as_u16(), "upstream returned an error status");
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}
