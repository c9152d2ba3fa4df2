use serde::Deserialize;
use thiserror::Error;

/// Failure reported to the presentation layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The proxy answered with its error envelope.
    #[error("{message} ({status} {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("no quote is currently displayed")]
    NoCurrentQuote,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    error: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    code: String,
    message: String,
}

/// Build an [`ClientError::Api`] from a failed response body.
pub(crate) fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => ClientError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Api {
            status,
            code: "unknown".to_string(),
            message: if body.is_empty() {
                "request failed".to_string()
            } else {
                body.to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_error_envelope() {
        let body = r#"{"error":{"code":"bad_request","message":"QuoteId is required","details":[],"trace_id":"t","timestamp":"now"}}"#;
        let error = api_error(400, body);
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.to_string(), "QuoteId is required (400 bad_request)");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let error = api_error(502, "Bad Gateway");
        match error {
            ClientError::Api { code, message, .. } => {
                assert_eq!(code, "unknown");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
