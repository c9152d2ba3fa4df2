//! Quote discovery proxy.
//!
//! Wires the proxy modules (quotes, favorites, recommendations, translate)
//! to their upstream services and serves them through the shared HTTP stack.

pub mod modules;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;

use anyhow::Context;

use quotes_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use services::Services;

/// Build the module registry for the given services
pub fn registry(services: &Services, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, services, settings);
    registry
}

/// Run the proxy until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    settings.validate().context("invalid settings")?;

    let services = Services::from_settings(&settings)?;
    let registry = registry(&services, &settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = quotes_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{services, EchoTranslator, FakeBackend};
    use axum::{
        body::Body,
        extract::Request,
        http::{header, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(backend: Arc<FakeBackend>) -> Router {
        let settings = Settings::default();
        let services = services(backend, Some(Arc::new(EchoTranslator::default())));
        quotes_http::build_router(&registry(&services, &settings), &settings)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer token-u1");
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn favorites_round_trip_through_the_full_stack() {
        let app = app(Arc::new(FakeBackend::with_quotes(5)));

        let response = app
            .clone()
            .oneshot(request("GET", "/api/quotes", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let quote = json_body(response).await;
        assert!(quote["id"].as_str().unwrap().starts_with("b1-q"));

        let response = app
            .clone()
            .oneshot(request("POST", "/api/favorites", Some(json!({"quoteId": "q1"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["id"], "f1");

        let response = app
            .clone()
            .oneshot(request("GET", "/api/favorites", None))
            .await
            .unwrap();
        let listed = json_body(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["quoteId"], "q1");

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/favorites", Some(json!({"quoteId": "q1"}))))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!({"success": true}));

        let response = app
            .oneshot(request("GET", "/api/favorites", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn openapi_document_lists_every_route() {
        let response = app(Arc::new(FakeBackend::default()))
            .oneshot(request("GET", "/docs/openapi.json", None))
            .await
            .unwrap();

        let doc = json_body(response).await;
        for path in [
            "/healthz",
            "/api/quotes",
            "/api/favorites",
            "/api/recommendations",
            "/api/translate",
            "/api/translate/languages",
        ] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
    }

    #[tokio::test]
    async fn errors_carry_the_envelope_through_the_stack() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_with(500);

        let response = app(backend)
            .oneshot(request("GET", "/api/recommendations", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Failed to fetch recommendations");
        assert_eq!(body["error"]["details"][0]["error"], "backend unavailable");
    }
}
