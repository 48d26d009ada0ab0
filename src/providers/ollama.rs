use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error};

use crate::errors::ProviderError;
use super::{Provider, build_http_client, read_success_body};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: reqwest::Client,
    /// Model name to use for generation
    model: String,
    /// Instruction prepended to every prompt
    system_prompt: String,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Whether to stream the response
    stream: bool,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete base URL
    pub fn from_url(
        url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            client: build_http_client(Duration::from_secs(60)),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    /// Full URL of the generate endpoint
    pub fn api_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Build the request for one batch of text; the instruction is prepended
    pub fn build_request(&self, text: &str) -> GenerationRequest {
        let prompt = format!("{}\n\n{}", self.system_prompt, text);
        GenerationRequest::new(&self.model, prompt)
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let response = self.client.post(self.api_url())
            .json(&request)
            .send()
            .await?;

        let body = read_success_body(response, "Ollama").await?;
        Self::parse_generation_body(&body)
    }

    /// Parse a generate response body.
    ///
    /// A single JSON object is expected. If the server streamed anyway, the
    /// body is newline-delimited JSON and the `response` pieces are joined.
    pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
        let error = match serde_json::from_str::<GenerationResponse>(body) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => e,
        };

        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", error, preview);

        let chunks: Vec<GenerationResponse> = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<GenerationResponse>(line).ok())
            .collect();

        if chunks.is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Ollama response is not valid JSON: {}", error
            )));
        }

        debug!("Recovered Ollama response from {} streamed chunks", chunks.len());

        let response = chunks.iter().map(|c| c.response.as_str()).collect::<String>();
        let last = chunks.last();
        Ok(GenerationResponse {
            model: last.map(|c| c.model.clone()).unwrap_or_default(),
            response,
            done: last.is_some_and(|c| c.done),
            prompt_eval_count: last.and_then(|c| c.prompt_eval_count),
            eval_count: last.and_then(|c| c.eval_count),
        })
    }
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let response = self.generate(self.build_request(text)).await?;

        if let (Some(prompt), Some(generated)) = (response.prompt_eval_count, response.eval_count) {
            debug!("Ollama usage: {} prompt / {} generated tokens", prompt, generated);
        }

        Ok(response.response)
    }
}
