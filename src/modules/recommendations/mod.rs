use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, State},
    routing::get,
    Json, Router,
};
use serde_json::json;

use quotes_auth::{CurrentUser, SharedIdentity};
use quotes_http::error::AppError;
use quotes_kernel::Module;
use quotes_model::Quote;
use quotes_upstream::QuoteBackend;

use crate::utils::upstream_error;

#[derive(Clone)]
struct RecommendationsState {
    backend: Arc<dyn QuoteBackend>,
    identity: SharedIdentity,
}

impl FromRef<RecommendationsState> for SharedIdentity {
    fn from_ref(state: &RecommendationsState) -> Self {
        state.identity.clone()
    }
}

/// Relays the backend's per-user quote recommendations.
pub struct RecommendationsModule {
    state: RecommendationsState,
}

impl RecommendationsModule {
    pub fn new(backend: Arc<dyn QuoteBackend>, identity: SharedIdentity) -> Self {
        Self {
            state: RecommendationsState { backend, identity },
        }
    }
}

#[async_trait]
impl Module for RecommendationsModule {
    fn name(&self) -> &'static str {
        "recommendations"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(recommendations))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Recommended quotes for the signed-in user",
                        "tags": ["Recommendations"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "Recommended quotes",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Quote" }
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "User not authenticated",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

async fn recommendations(
    State(state): State<RecommendationsState>,
    user: CurrentUser,
) -> Result<Json<Vec<Quote>>, AppError> {
    let quotes = state
        .backend
        .recommendations(&user.user_id)
        .await
        .map_err(|e| upstream_error(e, "Failed to fetch recommendations"))?;

    tracing::debug!(user_id = %user.user_id, count = quotes.len(), "recommendations served");
    Ok(Json(quotes))
}

/// Create a new instance of the recommendations module
pub fn create_module(backend: Arc<dyn QuoteBackend>, identity: SharedIdentity) -> Arc<dyn Module> {
    Arc::new(RecommendationsModule::new(backend, identity))
}
