//! Outbound clients: the quotes backend and the translation model.

pub mod backend;
pub mod error;
pub mod translator;

use std::time::Duration;

pub use backend::{HttpBackend, QuoteBackend};
pub use error::UpstreamError;
pub use translator::{ChatCompletionsTranslator, Language, Translator};

/// Shared reqwest client with a per-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("quotes-upstream/", env!("CARGO_PKG_VERSION")))
        .build()
}
