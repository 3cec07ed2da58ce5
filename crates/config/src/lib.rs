//! Configuration loading, validation, and management for Abacus.
//!
//! Loads configuration from `~/.abacus/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Instruction prepended to every decision step.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant tasked with performing \
arithmetic on a set of inputs. Use available tools when needed.";

/// The root configuration structure.
///
/// Maps directly to `~/.abacus/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Loop controller settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool registry settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Which wire dialect the model endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Azure OpenAI deployments (`api-key` header, `api-version` query)
    Azure,
    /// Any OpenAI-compatible `/chat/completions` endpoint (bearer auth)
    Openai,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::Openai),
            other => Err(ConfigError::ValidationError(format!(
                "unknown provider kind '{other}' (expected 'azure' or 'openai')"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderKind,

    /// Base endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Azure deployment name, or the model id for OpenAI-compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_kind() -> ProviderKind {
    ProviderKind::Azure
}
fn default_api_version() -> String {
    "2024-12-01-preview".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_provider_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            endpoint: None,
            api_key: None,
            deployment: None,
            api_version: default_api_version(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum decision steps per run before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_iterations() -> u32 {
    25
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base URL of a remote tool server, e.g. `http://127.0.0.1:8080/mcp`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,

    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_discovery_timeout() -> u64 {
    5
}
fn default_call_timeout() -> u64 {
    10
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            discovery_timeout_secs: default_discovery_timeout(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Idle time before the event stream writes a keep-alive comment
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8001
}
fn default_keep_alive() -> u64 {
    15
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keep_alive_secs: default_keep_alive(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.abacus/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides (highest priority).
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("ABACUS_PROVIDER") {
            self.provider.kind = kind.parse()?;
        }

        match self.provider.kind {
            ProviderKind::Azure => {
                if let Some(key) = lookup("AZURE_OPENAI_API_KEY") {
                    self.provider.api_key = Some(key);
                }
                if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
                    self.provider.endpoint = Some(endpoint);
                }
                if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
                    self.provider.api_version = version;
                }
                if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT_NAME") {
                    self.provider.deployment = Some(deployment);
                }
            }
            ProviderKind::Openai => {
                if let Some(key) = lookup("OPENAI_API_KEY") {
                    self.provider.api_key = Some(key);
                }
                if let Some(endpoint) = lookup("OPENAI_BASE_URL") {
                    self.provider.endpoint = Some(endpoint);
                }
                if let Some(model) = lookup("OPENAI_MODEL") {
                    self.provider.deployment = Some(model);
                }
            }
        }

        if let Some(url) = lookup("ABACUS_TOOL_SERVER_URL") {
            self.tools.remote_url = Some(url);
        }
        if let Some(host) = lookup("ABACUS_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("ABACUS_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("ABACUS_PORT is not a valid port: {port}"))
            })?;
        }
        if let Some(max) = lookup("ABACUS_MAX_ITERATIONS") {
            self.agent.max_iterations = max.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ABACUS_MAX_ITERATIONS is not a positive integer: {max}"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".abacus")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.gateway.keep_alive_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.keep_alive_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if model credentials are available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
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

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.kind, ProviderKind::Azure);
        assert_eq!(config.agent.max_iterations, 25);
        assert_eq!(config.gateway.port, 8001);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.api_version, config.provider.api_version);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn loads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[provider]
kind = "openai"
endpoint = "http://localhost:11434/v1"
deployment = "llama3"

[tools]
remote_url = "http://127.0.0.1:8080/mcp"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Openai);
        assert_eq!(config.provider.deployment.as_deref(), Some("llama3"));
        assert_eq!(
            config.tools.remote_url.as_deref(),
            Some("http://127.0.0.1:8080/mcp")
        );
        assert_eq!(config.tools.call_timeout_secs, 10);
        assert_eq!(config.gateway.keep_alive_secs, 15);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nkind = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn azure_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("AZURE_OPENAI_API_KEY", "secret"),
                ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
                ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o-mini"),
                ("ABACUS_PORT", "9000"),
                ("ABACUS_TOOL_SERVER_URL", "http://tools:8080/mcp"),
            ]))
            .unwrap();

        assert!(config.has_api_key());
        assert_eq!(config.provider.deployment.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.provider.api_version, "2024-12-01-preview");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(
            config.tools.remote_url.as_deref(),
            Some("http://tools:8080/mcp")
        );
    }

    #[test]
    fn provider_switch_reads_openai_vars() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("ABACUS_PROVIDER", "openai"),
                ("OPENAI_API_KEY", "sk-test"),
                ("AZURE_OPENAI_API_KEY", "ignored"),
            ]))
            .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::Openai);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("ABACUS_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("super-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("2024-12-01-preview"));
        assert!(toml_str.contains("8001"));
    }
}
