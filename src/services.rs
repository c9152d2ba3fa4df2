//! Outbound collaborators shared by the proxy modules.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use quotes_auth::{NoIdentityProvider, SharedIdentity, UserInfoProvider};
use quotes_kernel::settings::Settings;
use quotes_upstream::{ChatCompletionsTranslator, HttpBackend, QuoteBackend, Translator};

/// Handles to the backend, the translation model, and the identity provider.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn QuoteBackend>,
    /// `None` when no translation API key is configured.
    pub translator: Option<Arc<dyn Translator>>,
    pub identity: SharedIdentity,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let upstream_client =
            quotes_upstream::http_client(Duration::from_millis(settings.upstream.timeout_ms))
                .context("failed to build upstream HTTP client")?;

        let backend = HttpBackend::new(upstream_client.clone(), &settings.upstream.base_url)
            .context("invalid upstream.base_url")?;

        let translator: Option<Arc<dyn Translator>> = match &settings.translation.api_key {
            Some(api_key) if !api_key.trim().is_empty() => {
                let client = quotes_upstream::http_client(Duration::from_millis(
                    settings.translation.timeout_ms,
                ))
                .context("failed to build translation HTTP client")?;
                let translator = ChatCompletionsTranslator::new(
                    client,
                    &settings.translation.base_url,
                    api_key.trim(),
                    settings.translation.model.clone(),
                    settings.translation.temperature,
                )
                .context("invalid translation.base_url")?;
                Some(Arc::new(translator))
            }
            _ => {
                tracing::warn!("translation.api_key is not set; /api/translate will answer 503");
                None
            }
        };

        let identity: SharedIdentity = match &settings.auth.userinfo_url {
            Some(url) => Arc::new(
                UserInfoProvider::new(upstream_client, url).context("invalid auth.userinfo_url")?,
            ),
            None => {
                tracing::warn!("auth.userinfo_url is not set; authenticated routes will answer 401");
                Arc::new(NoIdentityProvider)
            }
        };

        Ok(Self {
            backend: Arc::new(backend),
            translator,
            identity,
        })
    }
}
