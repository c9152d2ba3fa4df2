//! Helpers shared by the proxy modules.

use axum::http::StatusCode;

use quotes_http::error::AppError;
use quotes_upstream::UpstreamError;

/// Convert an upstream failure into the response envelope.
///
/// Error statuses from the upstream are forwarded with its body under
/// `details`; anything else (unreachable, undecodable, empty) becomes a 502.
pub fn upstream_error(error: UpstreamError, message: &str) -> AppError {
    let forwarded = error
        .upstream_status()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .filter(|status| status.is_client_error() || status.is_server_error());

    match forwarded {
        Some(status) => {
            tracing::warn!(status = status.as_u16(), %error, "{message}");
            AppError::upstream(status, message, error.body().cloned())
        }
        None => {
            tracing::error!(%error, "{message}");
            AppError::upstream(StatusCode::BAD_GATEWAY, message, None)
        }
    }
}
