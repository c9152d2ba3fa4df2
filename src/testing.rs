//! In-memory stand-ins for the backend and the identity provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use time::macros::datetime;

use quotes_auth::{IdentityError, IdentityProvider, SharedIdentity};
use quotes_model::{CreateFavorite, DeleteFavorite, FavoriteQuote, Quote};
use quotes_upstream::{Language, QuoteBackend, Translator, UpstreamError};

use crate::services::Services;

pub fn quote(id: &str) -> Quote {
    Quote {
        id: id.to_string(),
        content: format!("content of {id}"),
        author: "A".to_string(),
        tags: vec![],
    }
}

#[derive(Default)]
pub struct FakeBackend {
    available: usize,
    random_calls: AtomicUsize,
    batches: AtomicUsize,
    failing_status: AtomicU16,
    favorites: Mutex<HashMap<String, Vec<FavoriteQuote>>>,
    next_favorite: AtomicUsize,
}

impl FakeBackend {
    /// Serve batches of at most `available` quotes.
    pub fn with_quotes(available: usize) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    /// Make every later call fail with `status`.
    pub fn fail_with(&self, status: u16) {
        self.failing_status.store(status, Ordering::SeqCst);
    }

    pub fn random_calls(&self) -> usize {
        self.random_calls.load(Ordering::SeqCst)
    }

    pub fn favorites_of(&self, user_id: &str) -> Vec<FavoriteQuote> {
        self.favorites
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed_favorite(&self, favorite: FavoriteQuote) {
        self.favorites
            .lock()
            .unwrap()
            .entry(favorite.user_id.clone())
            .or_default()
            .push(favorite);
    }

    fn check(&self) -> Result<(), UpstreamError> {
        match self.failing_status.load(Ordering::SeqCst) {
            0 => Ok(()),
            status => Err(UpstreamError::Status {
                status,
                body: Some(json!({"error": "backend unavailable"})),
            }),
        }
    }
}

#[async_trait]
impl QuoteBackend for FakeBackend {
    async fn random_quotes(&self, count: usize) -> Result<Vec<Quote>, UpstreamError> {
        self.random_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok((1..=count.min(self.available))
            .map(|n| quote(&format!("b{batch}-q{n}")))
            .collect())
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<FavoriteQuote>, UpstreamError> {
        self.check()?;
        Ok(self.favorites_of(user_id))
    }

    async fn add_favorite(&self, request: &CreateFavorite) -> Result<FavoriteQuote, UpstreamError> {
        self.check()?;
        let n = self.next_favorite.fetch_add(1, Ordering::SeqCst) + 1;
        let created = FavoriteQuote {
            id: format!("f{n}"),
            user_id: request.user_id.clone(),
            quote_id: request.quote_id.clone(),
            created_at: datetime!(2024-06-01 12:00:00 UTC),
            translated_content: request.translated_text.clone(),
            quote: quote(&request.quote_id),
        };
        self.seed_favorite(created.clone());
        Ok(created)
    }

    async fn remove_favorite(&self, request: &DeleteFavorite) -> Result<(), UpstreamError> {
        self.check()?;
        if let Some(list) = self.favorites.lock().unwrap().get_mut(&request.user_id) {
            list.retain(|fav| fav.quote_id != request.quote_id);
        }
        Ok(())
    }

    async fn recommendations(&self, user_id: &str) -> Result<Vec<Quote>, UpstreamError> {
        self.check()?;
        Ok(vec![quote(&format!("rec-for-{user_id}"))])
    }
}

/// Accepts the token `token-<user>` as user `<user>`.
pub struct StaticIdentity;

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError> {
        Ok(token.strip_prefix("token-").map(str::to_string))
    }
}

/// Echoes `<code>:<text>` and counts calls.
#[derive(Default)]
pub struct EchoTranslator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str, language: Language) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}:{}", language.code(), text))
    }
}

/// Fails every call with the given provider status.
pub struct RejectingTranslator {
    status: u16,
}

impl RejectingTranslator {
    pub fn with_status(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl Translator for RejectingTranslator {
    async fn translate(&self, _text: &str, _language: Language) -> Result<String, UpstreamError> {
        Err(UpstreamError::Status {
            status: self.status,
            body: Some(json!({"error": {"message": "Invalid API Key"}})),
        })
    }
}

pub fn services(backend: Arc<FakeBackend>, translator: Option<Arc<EchoTranslator>>) -> Services {
    let identity: SharedIdentity = Arc::new(StaticIdentity);
    Services {
        backend,
        translator: translator.map(|t| t as Arc<dyn Translator>),
        identity,
    }
}
