//! Translation through an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::{read_json, UpstreamError};

const SYSTEM_PROMPT: &str = "You are a professional translator. Translate the given text accurately while maintaining its meaning and tone. Only respond with the translation, nothing else.";

/// Target languages the translation proxy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Spanish,
    Korean,
    French,
    German,
    Italian,
    Portuguese,
    Russian,
    Japanese,
    Chinese,
    Khmer,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Spanish,
        Language::Korean,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Japanese,
        Language::Chinese,
        Language::Khmer,
    ];

    /// Look up a language by its wire code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| language.code() == code)
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::Korean => "ko",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::Khmer => "kh",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Language::Spanish => "Spanish",
            Language::Korean => "Korean",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese (Simplified)",
            Language::Khmer => "Khmer",
        }
    }

    /// Name as written into the model prompt, including style constraints.
    pub fn prompt_name(self) -> &'static str {
        match self {
            // Plain register: no formal sentence endings.
            Language::Korean => "Korean (don't use 입니다, 습니다, or 요)",
            other => other.name(),
        }
    }
}

/// Anything that can translate text into one of the supported languages.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, language: Language) -> Result<String, UpstreamError>;
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

fn build_messages(text: &str, language: Language) -> Vec<ChatMessage<'static>> {
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.into(),
        },
        ChatMessage {
            role: "user",
            content: format!(
                "Translate this text to {}: \"{}\"",
                language.prompt_name(),
                text
            )
            .into(),
        },
    ]
}

/// [`Translator`] backed by a hosted chat completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsTranslator {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsTranslator {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, UpstreamError> {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let endpoint =
            Url::parse(&endpoint).map_err(|e| UpstreamError::InvalidUrl(format!("{endpoint}: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }
}

#[async_trait]
impl Translator for ChatCompletionsTranslator {
    async fn translate(&self, text: &str, language: Language) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(text, language),
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            language = language.code(),
            chars = text.chars().count(),
            "requesting translation"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let completion: ChatResponse = read_json(response).await?;
        first_reply(completion)
    }
}

fn first_reply(completion: ChatResponse) -> Result<String, UpstreamError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(UpstreamError::Empty)
}
