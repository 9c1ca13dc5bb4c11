//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatbridge/config.json`) and environment.
//! It is read once at startup and never reloaded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Google Chat adapter settings.
    #[serde(default)]
    pub google_chat: GoogleChatConfig,
}

/// Listener address, verification token, outbound endpoint and bot identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleChatConfig {
    /// Adapter instance id, reported in platform metadata.
    #[serde(default)]
    pub id: Option<String>,

    /// Bind address for the callback server (default "0.0.0.0").
    #[serde(default = "default_host", alias = "callbackServerHost")]
    pub host: String,

    /// Port for the callback server (default 6200).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Expected bearer token on inbound requests. Empty or absent disables the check.
    /// Overridden by CHATBRIDGE_VERIFICATION_TOKEN env.
    #[serde(default)]
    pub verification_token: Option<String>,

    /// Static outbound webhook, used when an event carries no responseUrl.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// The bot's own identity on every canonical message.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Public base URL under which local image files are reachable (used by `PublicBaseResolver`).
    #[serde(default)]
    pub image_base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6200
}

fn default_bot_name() -> String {
    "chatbridge".to_string()
}

impl Default for GoogleChatConfig {
    fn default() -> Self {
        Self {
            id: None,
            host: default_host(),
            port: default_port(),
            verification_token: None,
            webhook_url: None,
            bot_name: default_bot_name(),
            image_base_url: None,
        }
    }
}

impl GoogleChatConfig {
    /// Configured token, trimmed; `None` when absent or blank (auth disabled).
    pub fn token(&self) -> Option<&str> {
        self.verification_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Resolve the verification token: env CHATBRIDGE_VERIFICATION_TOKEN overrides config.
pub fn resolve_verification_token(config: &Config) -> Option<String> {
    std::env::var("CHATBRIDGE_VERIFICATION_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| config.google_chat.token().map(str::to_string))
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATBRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatbridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
