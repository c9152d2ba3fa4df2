use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;

use quotes_auth::{CurrentUser, SharedIdentity};
use quotes_http::error::AppError;
use quotes_kernel::{InitCtx, Module};
use quotes_model::{
    sort_newest_first, AddFavorite, CreateFavorite, DeleteFavorite, FavoriteQuote, Removed,
    RemoveFavorite,
};
use quotes_upstream::QuoteBackend;

use crate::utils::upstream_error;

#[derive(Clone)]
struct FavoritesState {
    backend: Arc<dyn QuoteBackend>,
    identity: SharedIdentity,
}

impl FromRef<FavoritesState> for SharedIdentity {
    fn from_ref(state: &FavoritesState) -> Self {
        state.identity.clone()
    }
}

/// Proxies the signed-in user's favorites to the backend.
pub struct FavoritesModule {
    state: FavoritesState,
}

impl FavoritesModule {
    pub fn new(backend: Arc<dyn QuoteBackend>, identity: SharedIdentity) -> Self {
        Self {
            state: FavoritesState { backend, identity },
        }
    }
}

#[async_trait]
impl Module for FavoritesModule {
    fn name(&self) -> &'static str {
        "favorites"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            upstream = %ctx.settings.upstream.base_url,
            "favorites module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(list_favorites)
                    .post(add_favorite)
                    .delete(remove_favorite),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let with_description = |description: &str| {
            let mut response = error.clone();
            response["description"] = json!(description);
            response
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List favorites, newest first",
                        "tags": ["Favorites"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "Favorites of the signed-in user",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/FavoriteQuote" }
                                        }
                                    }
                                }
                            },
                            "401": with_description("User not authenticated"),
                            "502": with_description("Backend unreachable")
                        }
                    },
                    "post": {
                        "summary": "Add a favorite",
                        "tags": ["Favorites"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AddFavorite" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created favorite",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/FavoriteQuote" }
                                    }
                                }
                            },
                            "400": with_description("QuoteId is required"),
                            "401": with_description("User not authenticated")
                        }
                    },
                    "delete": {
                        "summary": "Remove a favorite",
                        "tags": ["Favorites"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RemoveFavorite" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Removed",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "success": { "type": "boolean" } }
                                        }
                                    }
                                }
                            },
                            "400": with_description("QuoteId is required"),
                            "401": with_description("User not authenticated")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "FavoriteQuote": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "userId": { "type": "string" },
                            "quoteId": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "translatedContent": { "type": "string" },
                            "quote": { "$ref": "#/components/schemas/Quote" }
                        },
                        "required": ["id", "userId", "quoteId", "createdAt", "quote"]
                    },
                    "AddFavorite": {
                        "type": "object",
                        "properties": {
                            "quoteId": { "type": "string" },
                            "translatedText": { "type": "string" }
                        },
                        "required": ["quoteId"]
                    },
                    "RemoveFavorite": {
                        "type": "object",
                        "properties": {
                            "quoteId": { "type": "string" }
                        },
                        "required": ["quoteId"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "favorites module stopped");
        Ok(())
    }
}

fn require_quote_id(quote_id: &str) -> Result<String, AppError> {
    let quote_id = quote_id.trim();
    if quote_id.is_empty() {
        return Err(AppError::bad_request("QuoteId is required"));
    }
    Ok(quote_id.to_string())
}

async fn list_favorites(
    State(state): State<FavoritesState>,
    user: CurrentUser,
) -> Result<Json<Vec<FavoriteQuote>>, AppError> {
    let mut favorites = state
        .backend
        .favorites(&user.user_id)
        .await
        .map_err(|e| upstream_error(e, "Failed to fetch favorites"))?;

    sort_newest_first(&mut favorites);
    Ok(Json(favorites))
}

async fn add_favorite(
    State(state): State<FavoritesState>,
    user: CurrentUser,
    body: Result<Json<AddFavorite>, JsonRejection>,
) -> Result<(StatusCode, Json<FavoriteQuote>), AppError> {
    let Json(body) = body?;
    let quote_id = require_quote_id(&body.quote_id)?;

    let request = CreateFavorite {
        user_id: user.user_id,
        quote_id,
        translated_text: body.translated_text.filter(|text| !text.trim().is_empty()),
    };

    let created = state
        .backend
        .add_favorite(&request)
        .await
        .map_err(|e| upstream_error(e, "Failed to add favorite"))?;

    tracing::info!(
        user_id = %request.user_id,
        quote_id = %request.quote_id,
        favorite_id = %created.id,
        "favorite added"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn remove_favorite(
    State(state): State<FavoritesState>,
    user: CurrentUser,
    body: Result<Json<RemoveFavorite>, JsonRejection>,
) -> Result<Json<Removed>, AppError> {
    let Json(body) = body?;
    let quote_id = require_quote_id(&body.quote_id)?;

    let request = DeleteFavorite {
        user_id: user.user_id,
        quote_id,
    };

    state
        .backend
        .remove_favorite(&request)
        .await
        .map_err(|e| upstream_error(e, "Failed to delete favorite"))?;

    tracing::info!(
        user_id = %request.user_id,
        quote_id = %request.quote_id,
        "favorite removed"
    );
    Ok(Json(Removed::ok()))
}

/// Create a new instance of the favorites module
pub fn create_module(backend: Arc<dyn QuoteBackend>, identity: SharedIdentity) -> Arc<dyn Module> {
    Arc::new(FavoritesModule::new(backend, identity))
}
