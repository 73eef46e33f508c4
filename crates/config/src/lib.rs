//! Configuration loading for LeadsBox.
//!
//! Loads configuration from a `config.toml` file with environment
//! variable overrides. Environment values are consumed as-is —
//! presence is the only check; validation of semantics belongs to the
//! components that use them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Frontend origin — CORS origin and OAuth redirect base.
    #[serde(default = "default_client_url")]
    pub client_url: String,

    /// Secret used to sign the session cookie.
    #[serde(default)]
    pub session_secret: String,

    /// Run environment: "dev", "production", or "test".
    #[serde(default = "default_env")]
    pub env: String,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Facebook OAuth application credentials.
    #[serde(default)]
    pub facebook: FacebookConfig,

    /// Telegram bot credentials.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Inbound webhook configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Vendor Graph API base URL.
    #[serde(default = "default_graph_base")]
    pub graph_api_base: String,
}

fn default_client_url() -> String {
    "http://localhost:3010".into()
}
fn default_env() -> String {
    "dev".into()
}
fn default_graph_base() -> String {
    "https://graph.facebook.com/v19.0".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_url: default_client_url(),
            session_secret: String::new(),
            env: default_env(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            facebook: FacebookConfig::default(),
            telegram: TelegramConfig::default(),
            webhook: WebhookConfig::default(),
            graph_api_base: default_graph_base(),
        }
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() { "\"\"" } else { "[REDACTED]" }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_url", &self.client_url)
            .field("session_secret", &redact(&self.session_secret))
            .field("env", &self.env)
            .field("server", &self.server)
            .field("store", &self.store)
            .field("facebook", &self.facebook)
            .field("telegram", &self.telegram)
            .field("webhook", &self.webhook)
            .field("graph_api_base", &self.graph_api_base)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3003
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. `":memory:"` for ephemeral.
    #[serde(default = "default_db_path")]
    pub database_path: String,
}

fn default_db_path() -> String {
    "leadsbox.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FacebookConfig {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub app_secret: String,

    /// Redirect URI registered with the Facebook app.
    #[serde(default)]
    pub redirect_uri: String,
}

impl std::fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &redact(&self.app_secret))
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Token echoed back during hub verification handshakes.
    #[serde(default)]
    pub verify_token: String,

    /// App secret used to validate X-Hub-Signature-256 headers.
    /// Empty = no validation.
    #[serde(default)]
    pub app_secret: String,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("verify_token", &redact(&self.verify_token))
            .field("app_secret", &redact(&self.app_secret))
            .finish()
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl AppConfig {
    /// Load configuration: `config.toml` in the working directory if
    /// present, then environment variable overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new("config.toml"))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Environment variables take priority over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CLIENT_URL") {
            self.client_url = v;
        }
        if let Ok(v) = std::env::var("SESSION_SECRET") {
            self.session_secret = v;
        }
        if let Ok(v) = std::env::var("APP_ENV") {
            self.env = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("DATABASE_PATH") {
            self.store.database_path = v;
        }
        if let Ok(v) = std::env::var("FACEBOOK_APP_ID") {
            self.facebook.app_id = v;
        }
        if let Ok(v) = std::env::var("FACEBOOK_APP_SECRET") {
            self.facebook.app_secret = v;
        }
        if let Ok(v) = std::env::var("FACEBOOK_REDIRECT_URI") {
            self.facebook.redirect_uri = v;
        }
        if let Ok(v) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Ok(v) = std::env::var("WEBHOOK_VERIFY_TOKEN") {
            self.webhook.verify_token = v;
        }
        if let Ok(v) = std::env::var("WEBHOOK_APP_SECRET") {
            self.webhook.app_secret = v;
        }
        if let Ok(v) = std::env::var("GRAPH_API_BASE") {
            self.graph_api_base = v;
        }
    }

    /// True when running in production.
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}
