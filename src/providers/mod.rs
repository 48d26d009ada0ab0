/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Anthropic: Claude messages API
 * - OpenAI: ChatGPT and DeepSeek chat completions (OpenAI-compatible)
 * - Ollama: Local LLM server
 * - Mock: Deterministic provider for tests and benchmarks
 */

use async_trait::async_trait;
use log::error;
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

use anthropic::Anthropic;
use ollama::Ollama;
use openai::OpenAI;

/// Common trait for all translation backends
///
/// A backend turns one block of text into one block of translated text. The
/// system instruction is part of the backend, so callers only hand over the
/// batch text.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Label used in logs
    fn name(&self) -> &str;

    /// Translate a block of text
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text, or the transport,
    ///   status or decoding failure that prevented it
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;

    /// Send a one-line request to check that the backend is reachable and answers
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.translate("Hello").await?;
        if response.trim().is_empty() {
            return Err(ProviderError::ParseError(format!("{} returned an empty response", self.name())));
        }
        Ok(())
    }
}

/// The backend selected for a run
#[derive(Debug)]
pub enum TranslationBackend {
    /// Claude messages API
    Claude(Anthropic),
    /// OpenAI chat completions
    ChatGpt(OpenAI),
    /// DeepSeek chat completions
    DeepSeek(OpenAI),
    /// Local Ollama server
    Ollama(Ollama),
}

impl TranslationBackend {
    /// Build the configured backend, with the system instruction rendered for
    /// the configured language pair
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let system_prompt = config.system_prompt()?;
        let endpoint = config.get_endpoint();
        let model = config.get_model();
        let api_key = config.api_key.clone();
        let timeout = Duration::from_secs(config.get_timeout_secs());

        let backend = match config.provider {
            TranslationProvider::Claude => Self::Claude(
                Anthropic::new(api_key, endpoint, model, system_prompt)
                    .with_max_tokens(config.max_tokens)
                    .with_timeout(timeout),
            ),
            TranslationProvider::ChatGpt => Self::ChatGpt(
                OpenAI::new(api_key, endpoint, model, system_prompt).with_timeout(timeout),
            ),
            TranslationProvider::DeepSeek => Self::DeepSeek(
                OpenAI::deepseek(api_key, endpoint, model, system_prompt).with_timeout(timeout),
            ),
            TranslationProvider::Ollama => Self::Ollama(
                Ollama::from_url(endpoint, model, system_prompt).with_timeout(timeout),
            ),
        };

        Ok(backend)
    }
}

#[async_trait]
impl Provider for TranslationBackend {
    fn name(&self) -> &str {
        match self {
            Self::Claude(client) => client.name(),
            Self::ChatGpt(client) | Self::DeepSeek(client) => client.name(),
            Self::Ollama(client) => client.name(),
        }
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        match self {
            Self::Claude(client) => client.translate(text).await,
            Self::ChatGpt(client) | Self::DeepSeek(client) => client.translate(text).await,
            Self::Ollama(client) => client.translate(text).await,
        }
    }
}

/// Build an HTTP client with the given request timeout
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Read a response body, turning non-success statuses into provider errors
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    provider: &str,
) -> Result<String, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider, status, error_text);
        return Err(ProviderError::from_status(status.as_u16(), error_text));
    }

    Ok(response.text().await?)
}
