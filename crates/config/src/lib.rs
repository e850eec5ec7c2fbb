//! Configuration loading, validation, and management for ChatBridge.
//!
//! Loads configuration from `~/.chatbridge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chatbridge_core::PromptLabels;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chatbridge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Vendor API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Upstream conversation keys
    #[serde(default)]
    pub session: SessionConfig,

    /// Prompt assembly and message handling
    #[serde(default)]
    pub prompt: PromptConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Log raw request payloads
    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
            debug_mode: false,
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a 5xx or connection failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds; the n-th retry waits `backoff_factor * 2^(n-1)`
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_api_url() -> String {
    "https://app.simplifique.ai/pt/chatbot/api/v1/message/".into()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_factor() -> f64 {
    0.7
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Prefix for generated user keys (`<base>_<8 hex>`)
    #[serde(default = "default_base_user_key")]
    pub base_user_key: String,
}

fn default_base_user_key() -> String {
    "default_user".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_user_key: default_base_user_key(),
        }
    }
}

/// What gets sent upstream as the `query` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Only the content of the latest user message
    LatestMessage,
    /// The assembled system + transcript prompt
    #[default]
    Transcript,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_user_label")]
    pub user_label: String,

    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    #[serde(default = "default_history_header")]
    pub history_header: String,

    #[serde(default)]
    pub query_mode: QueryMode,

    /// Reject requests containing roles other than system/user/assistant
    #[serde(default)]
    pub strict_roles: bool,

    /// Warn in the log when such roles are dropped
    #[serde(default = "default_true")]
    pub warn_unrecognized_roles: bool,

    /// Answer returned when the upstream reply carries no text
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
}

fn default_user_label() -> String {
    PromptLabels::default().user
}
fn default_assistant_label() -> String {
    PromptLabels::default().assistant
}
fn default_history_header() -> String {
    PromptLabels::default().history_header
}
fn default_fallback_answer() -> String {
    "Desculpe, não entendi sua solicitação.".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            user_label: default_user_label(),
            assistant_label: default_assistant_label(),
            history_header: default_history_header(),
            query_mode: QueryMode::default(),
            strict_roles: false,
            warn_unrecognized_roles: true,
            fallback_answer: default_fallback_answer(),
        }
    }
}

impl PromptConfig {
    /// The transcript labels as the assembler expects them.
    pub fn labels(&self) -> PromptLabels {
        PromptLabels {
            user: self.user_label.clone(),
            assistant: self.assistant_label.clone(),
            history_header: self.history_header.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatbridge/config.toml).
    ///
    /// Environment variables override file values:
    /// `PORT`, `HOST`, `DEBUG_MODE`, `BASE_USER_KEY`, `ALLOWED_ORIGINS`,
    /// `CHATBRIDGE_UPSTREAM_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, then apply overrides from `lookup`.
    pub fn load_with_env(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT is not a valid port: {port}"))
            })?;
        }

        if let Some(host) = lookup("HOST") {
            self.gateway.host = host;
        }

        if let Some(debug) = lookup("DEBUG_MODE") {
            self.gateway.debug_mode = debug.trim().eq_ignore_ascii_case("true");
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.gateway.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(base) = lookup("BASE_USER_KEY") {
            self.session.base_user_key = base;
        }

        if let Some(url) = lookup("CHATBRIDGE_UPSTREAM_URL") {
            self.upstream.api_url = url;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatbridge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upstream.api_url must not be empty".into(),
            ));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream.timeout_secs must be > 0".into(),
            ));
        }

        if !self.upstream.backoff_factor.is_finite() || self.upstream.backoff_factor < 0.0 {
            return Err(ConfigError::ValidationError(
                "upstream.backoff_factor must be >= 0".into(),
            ));
        }

        if self.prompt.user_label.is_empty()
            || self.prompt.assistant_label.is_empty()
            || self.prompt.history_header.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "prompt labels must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.gateway.allowed_origins, vec!["*".to_string()]);
        assert_eq!(config.upstream.timeout_secs, 20);
        assert_eq!(config.prompt.query_mode, QueryMode::Transcript);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_labels_are_portuguese() {
        let labels = AppConfig::default().prompt.labels();
        assert_eq!(labels, PromptLabels::default());
        assert_eq!(labels.user, "Usuário");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.upstream.api_url, config.upstream.api_url);
        assert_eq!(parsed.prompt.history_header, config.prompt.history_header);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.session.base_user_key, "default_user");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[prompt]
user_label = "User"
assistant_label = "Assistant"
history_header = "History:"
query_mode = "latest_message"
strict_roles = true

[upstream]
max_retries = 0
"#,
        )
        .unwrap();

        let config = AppConfig::load_with_env(&path, no_env).unwrap();
        assert_eq!(config.prompt.labels().assistant, "Assistant");
        assert_eq!(config.prompt.query_mode, QueryMode::LatestMessage);
        assert!(config.prompt.strict_roles);
        assert_eq!(config.upstream.max_retries, 0);
        assert_eq!(config.upstream.timeout_secs, 20);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9100"),
            ("DEBUG_MODE", "TRUE"),
            ("BASE_USER_KEY", "n8n"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("CHATBRIDGE_UPSTREAM_URL", "http://localhost:9999/message/"),
        ]);
        let config = AppConfig::load_with_env(Path::new("/nonexistent/config.toml"), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.gateway.port, 9100);
        assert!(config.gateway.debug_mode);
        assert_eq!(config.session.base_user_key, "n8n");
        assert_eq!(
            config.gateway.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.upstream.api_url, "http://localhost:9999/message/");
    }

    #[test]
    fn debug_mode_only_true_enables() {
        let config = AppConfig::load_with_env(Path::new("/nonexistent/config.toml"), |k| {
            (k == "DEBUG_MODE").then(|| "yes".to_string())
        })
        .unwrap();
        assert!(!config.gateway.debug_mode);
    }

    #[test]
    fn invalid_port_env_rejected() {
        let result = AppConfig::load_with_env(Path::new("/nonexistent/config.toml"), |k| {
            (k == "PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn empty_upstream_url_rejected() {
        let mut config = AppConfig::default();
        config.upstream.api_url = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_label_rejected() {
        let mut config = AppConfig::default();
        config.prompt.history_header = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("simplifique.ai"));
        assert!(toml_str.contains("8000"));
        assert!(toml_str.contains("transcript"));
    }
}
