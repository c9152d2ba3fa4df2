//! Identity resolution for authenticated proxy routes.
//!
//! Every request that acts on behalf of a user carries
//! `Authorization: Bearer <token>`. The token is resolved to a user id by the
//! hosted identity provider; handlers receive it through [`CurrentUser`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use quotes_http::error::AppError;

/// Failure while asking the identity provider about a token.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider returned status {0}")]
    Status(u16),

    #[error("invalid identity provider url: {0}")]
    InvalidUrl(String),
}

/// Resolves bearer tokens to user ids.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is not (or no longer) valid.
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError>;
}

pub type SharedIdentity = Arc<dyn IdentityProvider>;

/// Resolves tokens through an OIDC `userinfo` endpoint, using its `sub` claim.
#[derive(Clone)]
pub struct UserInfoProvider {
    client: Client,
    userinfo_url: Url,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
}

impl UserInfoProvider {
    pub fn new(client: Client, userinfo_url: &str) -> Result<Self, IdentityError> {
        let userinfo_url = Url::parse(userinfo_url)
            .map_err(|e| IdentityError::InvalidUrl(format!("{userinfo_url}: {e}")))?;
        Ok(Self {
            client,
            userinfo_url,
        })
    }
}

#[async_trait]
impl IdentityProvider for UserInfoProvider {
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError> {
        let response = self
            .client
            .get(self.userinfo_url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => return Err(IdentityError::Status(status.as_u16())),
            _ => {}
        }

        let info: UserInfo = response.json().await?;
        Ok(Some(info.sub).filter(|sub| !sub.is_empty()))
    }
}

/// Used when no identity provider is configured: every token is rejected.
pub struct NoIdentityProvider;

#[async_trait]
impl IdentityProvider for NoIdentityProvider {
    async fn resolve(&self, _token: &str) -> Result<Option<String>, IdentityError> {
        Ok(None)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SharedIdentity: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::unauthorized("User not authenticated"))?;

        let identity = SharedIdentity::from_ref(state);
        match identity.resolve(token).await {
            Ok(Some(user_id)) => Ok(CurrentUser { user_id }),
            Ok(None) => Err(AppError::unauthorized("User not authenticated")),
            Err(error) => {
                tracing::error!(%error, "identity provider lookup failed");
                Err(AppError::upstream(
                    StatusCode::BAD_GATEWAY,
                    "Identity provider unavailable",
                    None,
                ))
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request, routing::get, Router};
    use tower::ServiceExt;

    struct StaticProvider;

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError> {
            match token {
                "good" => Ok(Some("u1".to_string())),
                "broken" => Err(IdentityError::Status(503)),
                _ => Ok(None),
            }
        }
    }

    fn app() -> Router {
        let identity: SharedIdentity = Arc::new(StaticProvider);
        Router::new()
            .route("/me", get(|user: CurrentUser| async move { user.user_id }))
            .with_state(identity)
    }

    async fn call(authorization: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().uri("/me");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn parses_bearer_scheme_case_insensitively() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[tokio::test]
    async fn resolves_known_token() {
        let (status, body) = call(Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u1");
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_unauthorized() {
        assert_eq!(call(None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(Some("Bearer nope")).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        assert_eq!(call(Some("Bearer broken")).await.0, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn no_provider_rejects_everything() {
        let provider = NoIdentityProvider;
        assert_eq!(provider.resolve("anything").await.unwrap(), None);
    }
}
