//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.
//! Credentials come from the environment; everything else has defaults that
//! a toml file can override.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telegram credentials (bot login + relay user session)
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Gemini inference configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Media relay bridge configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram credentials. All four are required to run the bot; they are
/// normally provided through the environment, not the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Numeric client identifier, forwarded to the relay bridge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<i64>,

    /// Client secret, forwarded to the relay bridge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_hash: Option<String>,

    /// Persisted user session string, forwarded to the relay bridge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_string: Option<String>,

    /// Bot token for chat I/O
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

/// Gemini inference configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiConfig {
    /// API key (normally from GEMINI_API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override (default: gemini-2.5-flash)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Media relay bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the tgcalls bridge daemon
    #[serde(default = "default_relay_url")]
    pub base_url: String,

    /// Placeholder stream played on join so the call connection stays up
    #[serde(default = "default_keepalive_stream")]
    pub keepalive_stream: String,
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_keepalive_stream() -> String {
    "https://raw.githubusercontent.com/anars/blank-audio/master/10-minutes-of-silence.mp3".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: default_relay_url(),
            keepalive_stream: default_keepalive_stream(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the edge-tts gateway
    #[serde(default = "default_speech_url")]
    pub base_url: String,

    /// Voice profile
    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_speech_url() -> String {
    "http://127.0.0.1:5050".to_string()
}

fn default_voice() -> String {
    "hi-IN-SwaraNeural".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_url(),
            voice: default_voice(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The resolved required credentials; constructing this is the startup
/// "everything is present" check.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_id: i64,
    pub api_hash: String,
    pub session_string: String,
    pub bot_token: String,
    pub gemini_api_key: String,
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/crabvoice/config.toml
    /// 3. Local config: ./crabvoice.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(config, &system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(config, &local_config_path)?;
        }

        config = Self::apply_env_overrides(config)?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env
    /// overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        let mut config = Self::default();

        if path.exists() {
            config = Self::merge_from_file(config, path)?;
        } else {
            anyhow::bail!("Config file not found: {:?}", path);
        }

        config = Self::apply_env_overrides(config)?;
        Ok(config)
    }

    /// Get the system config path: ~/.config/crabvoice/config.toml
    fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crabvoice").join("config.toml"))
    }

    /// Get the local config path: ./crabvoice.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./crabvoice.toml")
    }

    /// Load and merge configuration from a TOML file
    fn merge_from_file(_base: Self, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let file_config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(file_config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Self) -> Result<Self> {
        if let Ok(api_id) = std::env::var("TELEGRAM_API_ID") {
            let parsed = api_id
                .parse::<i64>()
                .with_context(|| format!("TELEGRAM_API_ID is not numeric: {}", api_id))?;
            config.telegram.api_id = Some(parsed);
        }

        if let Ok(api_hash) = std::env::var("TELEGRAM_API_HASH") {
            config.telegram.api_hash = Some(api_hash);
        }

        if let Ok(session) = std::env::var("TELEGRAM_SESSION") {
            config.telegram.session_string = Some(session);
        }

        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = Some(token);
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("CRABVOICE_GEMINI_MODEL") {
            config.gemini.model = Some(model);
        }

        if let Ok(url) = std::env::var("CRABVOICE_RELAY_URL") {
            config.relay.base_url = url;
        }

        if let Ok(stream) = std::env::var("CRABVOICE_KEEPALIVE_STREAM") {
            config.relay.keepalive_stream = stream;
        }

        if let Ok(url) = std::env::var("CRABVOICE_TTS_URL") {
            config.speech.base_url = url;
        }

        if let Ok(voice) = std::env::var("CRABVOICE_TTS_VOICE") {
            config.speech.voice = voice;
        }

        if let Ok(log_level) = std::env::var("CRABVOICE_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Ok(log_file) = std::env::var("CRABVOICE_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(log_file));
        }

        Ok(config)
    }

    /// Resolve the credentials the bot cannot start without. Errors name
    /// the environment variable that is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            api_id: self
                .telegram
                .api_id
                .context("Telegram client identifier not set (TELEGRAM_API_ID)")?,
            api_hash: self
                .telegram
                .api_hash
                .clone()
                .context("Telegram client secret not set (TELEGRAM_API_HASH)")?,
            session_string: self
                .telegram
                .session_string
                .clone()
                .context("Telegram session string not set (TELEGRAM_SESSION)")?,
            bot_token: self
                .telegram
                .bot_token
                .clone()
                .context("Telegram bot token not set (TELEGRAM_BOT_TOKEN)")?,
            gemini_api_key: self
                .gemini
                .api_key
                .clone()
                .context("Gemini API key not set (GEMINI_API_KEY)")?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.relay.base_url.is_empty() {
            anyhow::bail!("Relay base_url is empty");
        }

        if self.speech.base_url.is_empty() {
            anyhow::bail!("Speech base_url is empty");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}
