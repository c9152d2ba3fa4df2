//! The quote currently on display and its transient translation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use quotes_model::{Quote, TranslateRequest};

use crate::api::QuotesApi;
use crate::error::ClientError;

/// Translated text for the displayed quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub text: String,
}

#[derive(Default)]
struct Displayed {
    quote: Option<Quote>,
    translation: Option<Translation>,
}

pub struct QuoteSession<A> {
    api: A,
    displayed: Mutex<Displayed>,
}

impl<A: QuotesApi> QuoteSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            displayed: Mutex::new(Displayed::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch a fresh quote and display it. Any translation of the previous
    /// quote is dropped; on failure nothing is displayed.
    pub async fn next_quote(&self) -> Result<Quote, ClientError> {
        match self.api.random_quote().await {
            Ok(quote) => {
                let mut displayed = self.displayed();
                displayed.quote = Some(quote.clone());
                displayed.translation = None;
                Ok(quote)
            }
            Err(error) => {
                *self.displayed() = Displayed::default();
                tracing::warn!(%error, "fetching a quote failed");
                Err(error)
            }
        }
    }

    /// Display `quote` directly, e.g. one picked from the recommendations.
    pub fn show(&self, quote: Quote) {
        let mut displayed = self.displayed();
        displayed.quote = Some(quote);
        displayed.translation = None;
    }

    pub fn current(&self) -> Option<Quote> {
        self.displayed().quote.clone()
    }

    pub fn translation(&self) -> Option<Translation> {
        self.displayed().translation.clone()
    }

    /// Translate the displayed quote into `language`.
    pub async fn translate(&self, language: &str) -> Result<Translation, ClientError> {
        let quote = self.current().ok_or(ClientError::NoCurrentQuote)?;

        let request = TranslateRequest {
            text: quote.content.clone(),
            target_language: language.to_string(),
        };
        let response = self.api.translate(&request).await?;
        let translation = Translation {
            language: language.to_string(),
            text: response.translated_text,
        };

        // The displayed quote may have changed while the request was in flight.
        let mut displayed = self.displayed();
        if displayed.quote.as_ref().map(|q| q.id.as_str()) == Some(quote.id.as_str()) {
            displayed.translation = Some(translation.clone());
        }
        Ok(translation)
    }

    fn displayed(&self) -> MutexGuard<'_, Displayed> {
        self.displayed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
