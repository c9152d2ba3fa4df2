//! Wire records exchanged between the quotes backend, the proxy, and its clients.
//!
//! All records serialize as camelCase JSON.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A tag attached to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// A quote owned by the upstream backend. Clients only hold read-only copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier for the quote
    pub id: String,
    /// Quote text
    pub content: String,
    /// Author attribution
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// A user's saved association to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteQuote {
    /// Server-issued identifier, or a provisional one while a create is in flight
    pub id: String,
    pub user_id: String,
    pub quote_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Translated snapshot saved alongside the favorite
    #[serde(
        default,
        alias = "translatedText",
        skip_serializing_if = "Option::is_none"
    )]
    pub translated_content: Option<String>,
    pub quote: Quote,
}

/// Body accepted by `POST /api/favorites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavorite {
    #[serde(default)]
    pub quote_id: String,
    #[serde(
        default,
        alias = "translatedContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub translated_text: Option<String>,
}

/// Body accepted by `DELETE /api/favorites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFavorite {
    #[serde(default)]
    pub quote_id: String,
}

/// Payload forwarded to the backend when creating a favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavorite {
    pub user_id: String,
    pub quote_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

/// Payload forwarded to the backend when deleting a favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFavorite {
    pub user_id: String,
    pub quote_id: String,
}

/// Success marker returned after a favorite is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
    pub success: bool,
}

impl Removed {
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

/// Body accepted by `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub target_language: String,
}

/// Translated text for the quote currently on display. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// One entry of `GET /api/translate/languages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

/// Sorts favorites newest first.
pub fn sort_newest_first(favorites: &mut [FavoriteQuote]) {
    favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
