use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::language_utils;
use crate::translation::prompts::PromptTemplate;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. The configuration is the
/// only place the translation core gets its plain values from: backend
/// selection, credentials and endpoint, and pipeline tuning.

/// Directory under the home directory holding the configuration file
const CONFIG_DIR_NAME: &str = ".subtranslator";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// API key (not needed for Ollama)
    #[serde(default)]
    pub api_key: String,

    /// Endpoint override; empty means the provider default
    #[serde(default)]
    pub endpoint: String,

    /// Model override; empty means the provider default
    #[serde(default)]
    pub model: String,

    /// Request timeout override in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Maximum tokens to generate (Claude only)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Default output directory; the input's directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Batch pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Anthropic Claude
    Claude,
    // @provider: OpenAI ChatGPT
    ChatGpt,
    // @provider: DeepSeek (OpenAI-compatible)
    DeepSeek,
    // @provider: Ollama
    #[default]
    Ollama,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Claude => "Claude",
            Self::ChatGpt => "ChatGPT",
            Self::DeepSeek => "DeepSeek",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Claude => "claude".to_string(),
            Self::ChatGpt => "chatgpt".to_string(),
            Self::DeepSeek => "deepseek".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Claude => "https://api.anthropic.com",
            Self::ChatGpt => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Claude => "claude-3-7-sonnet-20250219",
            Self::ChatGpt => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Ollama => "llama3.2:latest",
        }
    }

    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            Self::Ollama => 60,
            _ => 120,
        }
    }
}

// Implement Display trait for TranslationProvider
impl fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "chatgpt" | "openai" => Ok(Self::ChatGpt),
            "deepseek" => Ok(Self::DeepSeek),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!(
                "Unsupported LLM provider: {}. Supported providers: claude, chatgpt, ollama, deepseek",
                s
            )),
        }
    }
}

/// Batch pipeline settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Subtitle entries per backend request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Retries after the first failed attempt of a batch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Where progress is persisted between runs
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "bn".to_string()
}

fn default_batch_size() -> usize {
    80
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("translation_checkpoint.json")
}

impl Config {
    /// Default location of the configuration file, `~/.subtranslator/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine the home directory"))?;
        Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration file.
    ///
    /// A missing file yields the defaults. An unreadable or corrupt file is
    /// reported and also yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))
            .and_then(|content| {
                serde_json::from_str::<Config>(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            });

        match loaded {
            Ok(config) => config,
            Err(e) => {
                warn!("Error loading configuration: {:#}", e);
                Self::default()
            }
        }
    }

    /// Write the configuration file, creating its directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
            }
        }

        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Select a provider. The stored endpoint and model belong to the previous
    /// provider and are reset when the provider changes.
    pub fn switch_provider(&mut self, provider: TranslationProvider) {
        if provider != self.provider {
            self.endpoint.clear();
            self.model.clear();
        }
        self.provider = provider;
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        language_utils::get_language_name(&self.source_language)?;
        language_utils::get_language_name(&self.target_language)?;

        if language_utils::language_codes_match(&self.source_language, &self.target_language) {
            warn!("Source and target language are both '{}'", self.target_language);
        }

        if self.provider.requires_api_key() && self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "API key is required for {}. Set it with --api-key or using the config command.",
                self.provider.display_name()
            ));
        }

        let endpoint = self.get_endpoint();
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        if self.pipeline.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be at least 1"));
        }

        Ok(())
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if self.endpoint.trim().is_empty() {
            self.provider.default_endpoint().to_string()
        } else {
            self.endpoint.trim().to_string()
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if self.model.trim().is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.trim().to_string()
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or_else(|| self.provider.default_timeout_secs())
    }

    /// System instruction for the configured language pair
    pub fn system_prompt(&self) -> Result<String> {
        let source_name = language_utils::get_language_name(&self.source_language)?;
        let target_name = language_utils::get_language_name(&self.target_language)?;
        Ok(PromptTemplate::default().render(&source_name, &target_name))
    }

    /// API key masked for display, at most 8 characters
    pub fn masked_api_key(&self) -> Option<String> {
        if self.api_key.is_empty() {
            None
        } else {
            Some("*".repeat(self.api_key.chars().count().min(8)))
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            provider: TranslationProvider::default(),
            api_key: String::new(),
            endpoint: String::new(),
            model: String::new(),
            timeout_secs: None,
            max_tokens: default_max_tokens(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            output_dir: None,
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Human-readable summary used by `config --view`
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Configuration:")?;
        writeln!(f, "---------------------")?;
        writeln!(f, "LLM Provider: {}", self.provider)?;
        match self.masked_api_key() {
            Some(masked) => writeln!(f, "API Key: {}", masked)?,
            None => writeln!(f, "API Key: Not set")?,
        }
        writeln!(f, "Endpoint: {}", self.get_endpoint())?;
        writeln!(f, "Model: {}", self.get_model())?;
        writeln!(f, "Languages: {} -> {}", self.source_language, self.target_language)?;
        match &self.output_dir {
            Some(dir) => writeln!(f, "Output Directory: {}", dir.display())?,
            None => writeln!(f, "Output Directory: Not set (defaults to same directory as input)")?,
        }
        writeln!(f, "Batch Size: {}", self.pipeline.batch_size)?;
        writeln!(f, "Max Retries: {}", self.pipeline.max_retries)?;
        writeln!(f, "Retry Delay: {}s", self.pipeline.retry_delay_secs)?;
        write!(f, "Checkpoint: {}", self.pipeline.checkpoint_path.display())
    }
}
