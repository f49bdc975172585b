//! Configuration management for prompt-compressor
//!
//! Supports configuration via:
//! 1. Config file (~/.config/prompt-compressor/config.toml)
//! 2. Environment variables (GEMINI_API_KEY, STORE_API_KEY, etc.)
//! 3. CLI arguments (override file/env settings)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini provider configuration
    pub gemini: GeminiSettings,

    /// History store configuration
    pub store: StoreSettings,

    /// HTTP server configuration
    pub server: ServerSettings,
}

/// Gemini provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API key (can also use GEMINI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the generateContent API
    pub base_url: String,

    /// Model to use
    pub model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// History store settings (PostgREST/GoTrue-shaped backend)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Base URL of the backend (auth under /auth/v1, data under /rest/v1)
    pub base_url: String,

    /// Service API key (can also use STORE_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Table holding history rows
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            table: "history".to_string(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prompt-compressor")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config = config.with_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        // Gemini
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.gemini.model = model;
        }

        // History store
        if let Ok(url) = std::env::var("STORE_BASE_URL") {
            self.store.base_url = url;
        }
        if let Ok(key) = std::env::var("STORE_API_KEY") {
            self.store.api_key = Some(key);
        }

        self
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key().is_none() {
            return Err(ConfigError::MissingRequired(
                "Gemini API key (gemini.api_key or GEMINI_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }

    /// Get Gemini API key (from config or env)
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }

    /// Get store API key (from config or env)
    pub fn store_api_key(&self) -> Option<String> {
        self.store
            .api_key
            .clone()
            .or_else(|| std::env::var("STORE_API_KEY").ok())
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = Config::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini.api_key = Some(key.into());
        self
    }

    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini.model = model.into();
        self
    }

    pub fn store_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.store.base_url = url.into();
        self
    }

    pub fn store_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.store.api_key = Some(key.into());
        self
    }

    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.server.bind = addr.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
