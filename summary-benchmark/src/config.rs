//! Configuration management for the summary benchmark
//!
//! Loads provider and run settings from TOML files and parses model specs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Locations searched when no config path is given
const CONFIG_SEARCH_PATHS: [&str; 3] = [
    "config/models.toml",
    "../config/models.toml",
    "summary-benchmark/config/models.toml",
];

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub default_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    /// Requests per minute, 0 for unlimited
    #[serde(default = "default_rpm")]
    pub rpm: u32,
    /// Tokens per minute, 0 for unlimited
    #[serde(default = "default_tpm")]
    pub tpm: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature for the summary stage
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Model name prefixes that only accept `fixed_temperature`
    #[serde(default)]
    pub fixed_temperature_prefixes: Vec<String>,
    #[serde(default = "default_fixed_temperature")]
    pub fixed_temperature: f32,
}

impl ProviderConfig {
    /// Built-in settings for a provider
    pub fn defaults_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAI => Self {
                enabled: true,
                default_model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                rpm: 500,
                tpm: 200_000,
                max_output_tokens: default_max_output_tokens(),
                temperature: default_temperature(),
                fixed_temperature_prefixes: vec![
                    "gpt-5".to_string(),
                    "gpt-4.1".to_string(),
                    "o1".to_string(),
                ],
                fixed_temperature: default_fixed_temperature(),
            },
            ProviderKind::Gemini => Self {
                enabled: true,
                default_model: "gemini-1.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                rpm: default_rpm(),
                tpm: 1_000_000,
                max_output_tokens: default_max_output_tokens(),
                temperature: default_temperature(),
                fixed_temperature_prefixes: Vec::new(),
                fixed_temperature: default_fixed_temperature(),
            },
        }
    }

    /// Temperature the model will actually be sent
    pub fn temperature_for(&self, model: &str, requested: f32) -> f32 {
        let lowered = model.to_lowercase();
        if self
            .fixed_temperature_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(&prefix.to_lowercase()))
        {
            self.fixed_temperature
        } else {
            requested
        }
    }
}

/// Benchmark execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Run the key-event extraction stage before summarizing
    #[serde(default = "default_true")]
    pub extract_events: bool,
    /// Articles are cut to this many characters before prompting
    #[serde(default = "default_max_article_chars")]
    pub max_article_chars: usize,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub save_responses: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_responses: false,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_rpm() -> u32 { 60 }
fn default_tpm() -> u32 { 100_000 }
fn default_max_output_tokens() -> u32 { 2048 }
fn default_temperature() -> f32 { 0.4 }
fn default_fixed_temperature() -> f32 { 1.0 }
fn default_parallel_requests() -> usize { 3 }
fn default_retry_count() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_retry_delay_ms() -> u64 { 60_000 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_max_article_chars() -> usize { 5000 }
fn default_output_dir() -> String { "results/runs".to_string() }

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            parallel_requests: default_parallel_requests(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            extract_events: true,
            max_article_chars: default_max_article_chars(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load an explicit config file, or the first one found in the default
    /// locations, falling back to built-in defaults.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let config = Self::from_file(path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        for candidate in CONFIG_SEARCH_PATHS {
            let candidate = Path::new(candidate);
            if candidate.exists() {
                let config = Self::from_file(candidate)?;
                tracing::info!("Loaded configuration from {}", candidate.display());
                return Ok(config);
            }
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Get a specific provider config
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Provider settings for `kind`, built-in defaults when not configured
    pub fn provider(&self, kind: ProviderKind) -> ProviderConfig {
        self.get_provider(kind.as_str())
            .cloned()
            .unwrap_or_else(|| ProviderConfig::defaults_for(kind))
    }
}

impl Default for Config {
    fn default() -> Self {
        let providers = ProviderKind::all()
            .into_iter()
            .map(|kind| (kind.as_str().to_string(), ProviderConfig::defaults_for(kind)))
            .collect();

        Self {
            providers,
            benchmark: BenchmarkConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid model specification '{0}'")]
    InvalidModelSpec(String),

    #[error("Unsupported provider '{0}'")]
    UnknownProvider(String),

    #[error("Model '{0}' is listed more than once")]
    DuplicateModel(String),
}

/// Supported generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn all() -> Vec<ProviderKind> {
        vec![ProviderKind::OpenAI, ProviderKind::Gemini]
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A model to benchmark, written `provider:model` or just `model` (OpenAI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model: String,
}

impl ModelSpec {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Label used as the model key in reports
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl FromStr for ModelSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = match s.split_once(':') {
            Some((provider, model)) => (provider.parse()?, model.trim()),
            None => (ProviderKind::OpenAI, s.trim()),
        };

        if model.is_empty() {
            return Err(ConfigError::InvalidModelSpec(s.to_string()));
        }

        Ok(Self::new(provider, model))
    }
}

/// Parse the models of one run. Two entries naming the same
/// `provider:model` are rejected, since reports key results by that label.
pub fn parse_model_specs<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ModelSpec>, ConfigError> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(raw.len());
    for entry in raw {
        let spec: ModelSpec = entry.as_ref().parse()?;
        if !seen.insert(spec.clone()) {
            return Err(ConfigError::DuplicateModel(spec.label()));
        }
        specs.push(spec);
    }
    Ok(specs)
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}
