//! Configuration loading, validation, and management for Iqraa.
//!
//! Loads configuration from `~/.iqraa/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.iqraa/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Durable documents, journal, and mirror
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Text generation backend
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding `session.json`, `project.json`, `concept-graph.json`
    /// and the journal file.
    #[serde(default = "default_memory_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_journal_file")]
    pub journal_file: String,

    #[serde(default)]
    pub mirror: MirrorConfig,
}

fn default_memory_dir() -> PathBuf {
    AppConfig::config_dir().join("memory")
}
fn default_journal_file() -> String {
    "memory-journal.log".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: default_memory_dir(),
            journal_file: default_journal_file(),
            mirror: MirrorConfig::default(),
        }
    }
}

impl MemoryConfig {
    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(&self.journal_file)
    }

    /// Mirror directory, defaulting to `<memory.dir>/mirror`.
    pub fn mirror_dir(&self) -> PathBuf {
        self.mirror
            .dir
            .clone()
            .unwrap_or_else(|| self.dir.join("mirror"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Bucket for session and project documents
    #[serde(default = "default_main_bucket")]
    pub main_bucket: String,

    /// Bucket for the concept graph
    #[serde(default = "default_concept_bucket")]
    pub concept_bucket: String,
}

fn default_main_bucket() -> String {
    "iqraa-dashboard-memory".into()
}
fn default_concept_bucket() -> String {
    "concept-graph-memory".into()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            main_bucket: default_main_bucket(),
            concept_bucket: default_concept_bucket(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// "mock", "openai", "openrouter", "ollama", or any name with `api_url` set
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "mock".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Persona used when neither the request nor the session names one.
    /// Unknown ids fall back to the built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_persona: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.iqraa/config.toml).
    ///
    /// Environment overrides:
    /// - `IQRAA_AI_PROVIDER` replaces `generator.provider`
    /// - `IQRAA_API_KEY`, then `OPENAI_API_KEY`, fill a missing `generator.api_key`
    /// - `IQRAA_MODEL` replaces `generator.model`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through `lookup`, so callers (and tests)
    /// control where values come from.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("IQRAA_AI_PROVIDER").filter(|p| !p.trim().is_empty()) {
            self.generator.provider = provider.trim().to_lowercase();
        }

        if self.generator.api_key.is_none() {
            self.generator.api_key = lookup("IQRAA_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(model) = lookup("IQRAA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.generator.model = model;
        }
    }

    /// Get the configuration directory path. `IQRAA_HOME` overrides it.
    pub fn config_dir() -> PathBuf {
        match std::env::var("IQRAA_HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home),
            _ => dirs_home().join(".iqraa"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.temperature < 0.0 || self.generator.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generator.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.generator.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generator.max_tokens must be > 0".into(),
            ));
        }

        if self.memory.journal_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "memory.journal_file must not be empty".into(),
            ));
        }

        let mirror = &self.memory.mirror;
        if mirror.main_bucket.trim().is_empty() || mirror.concept_bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "memory.mirror bucket names must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.generator.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
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

impl From<ConfigError> for iqraa_core::Error {
    fn from(err: ConfigError) -> Self {
        iqraa_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.generator.provider, "mock");
        assert_eq!(config.memory.mirror.main_bucket, "iqraa-dashboard-memory");
        assert_eq!(config.memory.mirror.concept_bucket, "concept-graph-memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generator.provider, config.generator.provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.memory.dir, config.memory.dir);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.generator.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_bucket_rejected() {
        let mut config = AppConfig::default();
        config.memory.mirror.concept_bucket = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.generator.provider, "mock");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
[memory]
dir = "/var/lib/iqraa"

[memory.mirror]
enabled = false

[pipeline]
default_persona = "policy-strategist"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.memory.dir, PathBuf::from("/var/lib/iqraa"));
        assert!(!config.memory.mirror.enabled);
        assert_eq!(config.memory.journal_path(), PathBuf::from("/var/lib/iqraa/memory-journal.log"));
        assert_eq!(config.memory.mirror_dir(), PathBuf::from("/var/lib/iqraa/mirror"));
        assert_eq!(config.pipeline.default_persona.as_deref(), Some("policy-strategist"));
        assert_eq!(config.generator.max_tokens, 2048);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[generator\nprovider = ").unwrap();
        let err = AppConfig::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply_in_priority_order() {
        let env: HashMap<&str, &str> = [
            ("IQRAA_AI_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("IQRAA_MODEL", "gpt-4o"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.generator.provider, "openai");
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(config.generator.model, "gpt-4o");
    }

    #[test]
    fn configured_api_key_wins_over_env() {
        let mut config = AppConfig::default();
        config.generator.api_key = Some("from-file".into());
        config.apply_env_overrides(|k| (k == "IQRAA_API_KEY").then(|| "from-env".to_string()));
        assert_eq!(config.generator.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.generator.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("iqraa-dashboard-memory"));
        assert!(toml_str.contains("mock"));
    }
}
