use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "QUOTES_ENV";
const CONFIG_DIR_ENV: &str = "QUOTES_CONFIG_DIR";
const ENV_PREFIX: &str = "QUOTES";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub quotes: QuotePoolSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub client: ClientSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `QUOTES_`-prefixed variables (`__` separates nested keys, e.g.
    /// `QUOTES_UPSTREAM__BASE_URL`).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let environment: Environment = environment.parse()?;

        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .context("unable to resolve current directory")?,
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment.as_str()));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = environment;

        Ok(settings)
    }

    /// Reject settings the proxy cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            bail!("upstream.base_url must not be empty");
        }
        if self.quotes.pool_size == 0 {
            bail!("quotes.pool_size must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.translation.temperature) {
            bail!(
                "translation.temperature must be within 0.0..=2.0, got {}",
                self.translation.temperature
            );
        }
        Ok(())
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// The quotes / favorites / recommendations backend.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "UpstreamSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "UpstreamSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl UpstreamSettings {
    fn default_base_url() -> String {
        "http://localhost:3333/api".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10000
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for translation.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "TranslationSettings::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "TranslationSettings::default_model")]
    pub model: String,
    #[serde(default = "TranslationSettings::default_temperature")]
    pub temperature: f32,
    #[serde(default = "TranslationSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl TranslationSettings {
    fn default_base_url() -> String {
        "https://api.groq.com/openai/v1".to_string()
    }

    fn default_model() -> String {
        "llama-3.3-70b-versatile".to_string()
    }

    fn default_temperature() -> f32 {
        0.3
    }

    fn default_timeout_ms() -> u64 {
        20000
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Hosted identity provider. Bearer tokens are resolved through its OIDC
/// `userinfo` endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthSettings {
    #[serde(default)]
    pub userinfo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotePoolSettings {
    #[serde(default = "QuotePoolSettings::default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "QuotePoolSettings::default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub warm_on_start: bool,
}

impl QuotePoolSettings {
    fn default_pool_size() -> usize {
        50
    }

    fn default_ttl_secs() -> u64 {
        60
    }
}

impl Default for QuotePoolSettings {
    fn default() -> Self {
        Self {
            pool_size: Self::default_pool_size(),
            ttl_secs: Self::default_ttl_secs(),
            warm_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=debug".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where the command-line front end finds the proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "ClientSettings::default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl ClientSettings {
    fn default_server_url() -> String {
        "http://127.0.0.1:8080".to_string()
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: Self::default_server_url(),
            token: None,
        }
    }
}
