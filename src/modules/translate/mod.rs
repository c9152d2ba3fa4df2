use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use quotes_http::error::AppError;
use quotes_kernel::{InitCtx, Module};
use quotes_model::{LanguageInfo, TranslateRequest, TranslateResponse};
use quotes_upstream::{Language, Translator};

type SharedTranslator = Option<Arc<dyn Translator>>;

/// Translates quote text through the hosted language model.
pub struct TranslateModule {
    translator: SharedTranslator,
}

impl TranslateModule {
    pub fn new(translator: SharedTranslator) -> Self {
        Self { translator }
    }
}

#[async_trait]
impl Module for TranslateModule {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            model = %ctx.settings.translation.model,
            enabled = self.translator.is_some(),
            "translate module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(translate))
            .route("/languages", get(languages))
            .with_state(self.translator.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let codes: Vec<_> = Language::ALL.iter().map(|l| l.code()).collect();
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Translate text",
                        "tags": ["Translate"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/TranslateRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Translated text",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/TranslateResponse" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Empty text or unsupported language",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "502": {
                                "description": "Translation provider failed",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "503": {
                                "description": "Translation is not configured",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/languages": {
                    "get": {
                        "summary": "Supported target languages",
                        "tags": ["Translate"],
                        "responses": {
                            "200": {
                                "description": "Language codes and names",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "type": "object",
                                                "properties": {
                                                    "code": { "type": "string" },
                                                    "name": { "type": "string" }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "TranslateRequest": {
                        "type": "object",
                        "properties": {
                            "text": { "type": "string" },
                            "targetLanguage": { "type": "string", "enum": codes }
                        },
                        "required": ["text", "targetLanguage"]
                    },
                    "TranslateResponse": {
                        "type": "object",
                        "properties": {
                            "translatedText": { "type": "string" }
                        },
                        "required": ["translatedText"]
                    }
                }
            }
        }))
    }
}

async fn translate(
    State(translator): State<SharedTranslator>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, AppError> {
    let Json(body) = body?;

    let text = body.text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("text must not be empty"));
    }
    let language = Language::from_code(body.target_language.trim()).ok_or_else(|| {
        let supported: Vec<_> = Language::ALL.iter().map(|l| l.code()).collect();
        AppError::bad_request(format!(
            "unsupported target language '{}'; expected one of {}",
            body.target_language,
            supported.join(", ")
        ))
    })?;

    let translator = translator.ok_or_else(|| {
        AppError::unavailable("translation_unavailable", "Translation is not configured")
    })?;

    let translated_text = translator
        .translate(text, language)
        .await
        .map_err(|error| {
            // Provider statuses (bad API key, rate limits) are ours, not the caller's.
            tracing::error!(%error, language = language.code(), "translation failed");
            AppError::upstream(StatusCode::BAD_GATEWAY, "Translation failed", None)
        })?;

    Ok(Json(TranslateResponse { translated_text }))
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::ALL
            .iter()
            .map(|language| LanguageInfo {
                code: language.code().to_string(),
                name: language.name().to_string(),
            })
            .collect(),
    )
}

/// Create a new instance of the translate module
pub fn create_module(translator: SharedTranslator) -> Arc<dyn Module> {
    Arc::new(TranslateModule::new(translator))
}
