/*!
 * OpenAI-compatible chat completions client.
 *
 * Serves both ChatGPT and DeepSeek, which share the request and response
 * shape and differ only in endpoint, model and a response format hint.
 */

use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use log::debug;

use crate::errors::ProviderError;
use super::{Provider, build_http_client, read_success_body};

/// Client for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAI {
    /// Display name used in logs
    name: String,
    /// HTTP client for API requests
    client: reqwest::Client,
    /// API key for bearer authentication
    api_key: String,
    /// Base URL up to and including the API version segment
    endpoint: String,
    /// Model identifier
    model: String,
    /// System instruction sent with every request
    system_prompt: String,
    /// Optional response format hint
    response_format: Option<ResponseFormat>,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// Conversation messages, system first
    messages: Vec<OpenAIMessage>,

    /// Requested response format
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Response format hint
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message; may be null in responses
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

/// Single choice in a chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            response_format: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the response format
    pub fn response_format(mut self, format: Option<ResponseFormat>) -> Self {
        self.response_format = format;
        self
    }
}

impl OpenAI {
    /// Create a client for the OpenAI API
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: "ChatGPT".to_string(),
            client: build_http_client(Duration::from_secs(120)),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            response_format: None,
        }
    }

    /// Create a client for the DeepSeek API
    pub fn deepseek(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: "DeepSeek".to_string(),
            response_format: Some(ResponseFormat { format_type: "text".to_string() }),
            ..Self::new(api_key, endpoint, model, system_prompt)
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    /// Full URL of the chat completions endpoint
    pub fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Build the request for one batch of text
    pub fn build_request(&self, text: &str) -> OpenAIRequest {
        OpenAIRequest::new(&self.model)
            .add_message("system", &self.system_prompt)
            .add_message("user", text)
            .response_format(self.response_format.clone())
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self.client.post(self.api_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_success_body(response, &self.name).await?;

        serde_json::from_str::<OpenAIResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{} response: {}", self.name, e)))
    }

    /// Extract the first choice's message content
    pub fn extract_text(response: &OpenAIResponse) -> Option<String> {
        response.choices.first()
            .and_then(|choice| choice.message.content.clone())
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let response = self.complete(self.build_request(text)).await?;

        if let Some(usage) = &response.usage {
            debug!("{} usage: {} prompt / {} completion tokens",
                   self.name, usage.prompt_tokens, usage.completion_tokens);
        }

        Self::extract_text(&response).ok_or_else(|| {
            ProviderError::ParseError(format!("{} response is missing choices[0].message.content", self.name))
        })
    }
}
