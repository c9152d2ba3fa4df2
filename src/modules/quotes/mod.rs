pub mod pool;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::header::{HeaderValue, CACHE_CONTROL},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use quotes_http::error::AppError;
use quotes_kernel::{settings::QuotePoolSettings, InitCtx, Module};
use quotes_upstream::QuoteBackend;

use crate::utils::upstream_error;
use pool::QuotePool;

/// Serves one random quote per request out of a short-lived pool.
pub struct QuotesModule {
    pool: Arc<QuotePool>,
    warm_on_start: bool,
}

impl QuotesModule {
    pub fn new(backend: Arc<dyn QuoteBackend>, settings: &QuotePoolSettings) -> Self {
        Self {
            pool: Arc::new(QuotePool::new(
                backend,
                settings.pool_size,
                Duration::from_secs(settings.ttl_secs),
            )),
            warm_on_start: settings.warm_on_start,
        }
    }
}

#[async_trait]
impl Module for QuotesModule {
    fn name(&self) -> &'static str {
        "quotes"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            pool_size = ctx.settings.quotes.pool_size,
            ttl_secs = ctx.settings.quotes.ttl_secs,
            "quotes module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(random_quote))
            .with_state(self.pool.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Random quote",
                        "description": "Returns one quote from a pooled batch; a quote is not repeated until the batch is refilled.",
                        "tags": ["Quotes"],
                        "responses": {
                            "200": {
                                "description": "A quote",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Quote" }
                                    }
                                }
                            },
                            "502": {
                                "description": "Backend unreachable",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Tag": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" }
                        },
                        "required": ["id", "name"]
                    },
                    "Quote": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Unique identifier for the quote" },
                            "content": { "type": "string", "description": "Quote text" },
                            "author": { "type": "string", "description": "Author attribution" },
                            "tags": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Tag" }
                            }
                        },
                        "required": ["id", "content", "author"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.warm_on_start {
            match self.pool.warm().await {
                Ok(count) => tracing::info!(module = self.name(), count, "quote pool warmed"),
                Err(error) => {
                    tracing::warn!(module = self.name(), %error, "quote pool warm-up failed")
                }
            }
        }
        tracing::info!(module = self.name(), "quotes module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "quotes module stopped");
        Ok(())
    }
}

/// Random quote endpoint
async fn random_quote(State(pool): State<Arc<QuotePool>>) -> Result<impl IntoResponse, AppError> {
    let quote = pool
        .take()
        .await
        .map_err(|e| upstream_error(e, "Failed to fetch random quote"))?;

    Ok((
        [(CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(quote),
    ))
}

/// Create a new instance of the quotes module
pub fn create_module(
    backend: Arc<dyn QuoteBackend>,
    settings: &QuotePoolSettings,
) -> Arc<dyn Module> {
    Arc::new(QuotesModule::new(backend, settings))
}
