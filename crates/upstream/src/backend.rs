//! Client for the quotes / favorites / recommendations backend.

use async_trait::async_trait;
use reqwest::{Client, Url};

use quotes_model::{CreateFavorite, DeleteFavorite, FavoriteQuote, Quote};

use crate::error::{ensure_success, read_json, UpstreamError};

/// Operations the proxy needs from the backend.
#[async_trait]
pub trait QuoteBackend: Send + Sync {
    /// `GET /quotes/random?count={count}`
    async fn random_quotes(&self, count: usize) -> Result<Vec<Quote>, UpstreamError>;

    /// `GET /favorites/{user_id}`
    async fn favorites(&self, user_id: &str) -> Result<Vec<FavoriteQuote>, UpstreamError>;

    /// `POST /favorites`
    async fn add_favorite(&self, request: &CreateFavorite) -> Result<FavoriteQuote, UpstreamError>;

    /// `DELETE /favorites/{user_id}`
    async fn remove_favorite(&self, request: &DeleteFavorite) -> Result<(), UpstreamError>;

    /// `GET /recommendations/{user_id}`
    async fn recommendations(&self, user_id: &str) -> Result<Vec<Quote>, UpstreamError>;
}

/// reqwest-backed [`QuoteBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: &str) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Append percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl QuoteBackend for HttpBackend {
    async fn random_quotes(&self, count: usize) -> Result<Vec<Quote>, UpstreamError> {
        let url = self.endpoint(&["quotes", "random"])?;
        tracing::debug!(%url, count, "fetching random quotes");

        let response = self
            .client
            .get(url)
            .query(&[("count", count)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<FavoriteQuote>, UpstreamError> {
        let url = self.endpoint(&["favorites", user_id])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn add_favorite(&self, request: &CreateFavorite) -> Result<FavoriteQuote, UpstreamError> {
        let url = self.endpoint(&["favorites"])?;
        let response = self.client.post(url).json(request).send().await?;
        read_json(response).await
    }

    async fn remove_favorite(&self, request: &DeleteFavorite) -> Result<(), UpstreamError> {
        let url = self.endpoint(&["favorites", &request.user_id])?;
        let response = self.client.delete(url).json(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn recommendations(&self, user_id: &str) -> Result<Vec<Quote>, UpstreamError> {
        let url = self.endpoint(&["recommendations", user_id])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Client::new(), base).unwrap()
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let backend = backend("http://localhost:3333/api");
        let url = backend.endpoint(&["quotes", "random"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/quotes/random");
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let backend = backend("http://localhost:3333/api/");
        let url = backend.endpoint(&["favorites", "u1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/favorites/u1");
    }

    #[test]
    fn user_ids_are_percent_encoded() {
        let backend = backend("http://localhost:3333/api");
        let url = backend.endpoint(&["favorites", "user/../admin"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3333/api/favorites/user%2F..%2Fadmin"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(HttpBackend::new(Client::new(), "mailto:someone@example.com").is_err());
        assert!(HttpBackend::new(Client::new(), "not a url").is_err());
    }
}
