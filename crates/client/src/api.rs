//! HTTP client for the quotes proxy.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use quotes_model::{
    AddFavorite, FavoriteQuote, LanguageInfo, Quote, Removed, RemoveFavorite, TranslateRequest,
    TranslateResponse,
};

use crate::error::{api_error, ClientError};

/// Favorites endpoints, scoped to the authenticated user.
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn list_favorites(&self) -> Result<Vec<FavoriteQuote>, ClientError>;
    async fn add_favorite(&self, request: &AddFavorite) -> Result<FavoriteQuote, ClientError>;
    async fn remove_favorite(&self, request: &RemoveFavorite) -> Result<(), ClientError>;
}

/// Quote, recommendation, and translation endpoints.
#[async_trait]
pub trait QuotesApi: Send + Sync {
    async fn random_quote(&self) -> Result<Quote, ClientError>;
    async fn recommendations(&self) -> Result<Vec<Quote>, ClientError>;
    async fn translate(&self, request: &TranslateRequest)
        -> Result<TranslateResponse, ClientError>;
    async fn languages(&self) -> Result<Vec<LanguageInfo>, ClientError>;
}

/// reqwest-backed client for the proxy's `/api` routes.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ProxyClient {
    pub fn new(client: Client, server_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(server_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{server_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(server_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl FavoritesApi for ProxyClient {
    async fn list_favorites(&self) -> Result<Vec<FavoriteQuote>, ClientError> {
        let url = self.url("api/favorites")?;
        self.send(self.client.get(url)).await
    }

    async fn add_favorite(&self, request: &AddFavorite) -> Result<FavoriteQuote, ClientError> {
        let url = self.url("api/favorites")?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn remove_favorite(&self, request: &RemoveFavorite) -> Result<(), ClientError> {
        let url = self.url("api/favorites")?;
        let _: Removed = self.send(self.client.delete(url).json(request)).await?;
        Ok(())
    }
}

#[async_trait]
impl QuotesApi for ProxyClient {
    async fn random_quote(&self) -> Result<Quote, ClientError> {
        let url = self.url("api/quotes")?;
        self.send(self.client.get(url)).await
    }

    async fn recommendations(&self) -> Result<Vec<Quote>, ClientError> {
        let url = self.url("api/recommendations")?;
        self.send(self.client.get(url)).await
    }

    async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, ClientError> {
        let url = self.url("api/translate")?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn languages(&self) -> Result<Vec<LanguageInfo>, ClientError> {
        let url = self.url("api/translate/languages")?;
        self.send(self.client.get(url)).await
    }
}
