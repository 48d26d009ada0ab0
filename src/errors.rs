/*!
 * Error types for the subtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only `PipelineError` crosses the batch pipeline boundary. Provider failures and
 * segment count mismatches are retried inside the pipeline, and checkpoint I/O
 * failures are downgraded to warnings by the checkpoint store.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails or an expected field is missing
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection, including timeouts
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to the matching error variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while translating a single batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The response did not split into one segment per subtitle entry
    #[error("Batch translation mismatch: expected {expected} segments, received {received}")]
    CountMismatch {
        /// Number of entries in the batch
        expected: usize,
        /// Number of segments in the response
        received: usize,
    },
}

/// Terminal error of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// All attempts for one batch failed; the run stopped at that batch
    #[error("Batch {batch_index} failed after all retries: {source}")]
    BatchFailed {
        /// Zero-based index of the failed batch
        batch_index: usize,
        /// The error of the last attempt
        #[source]
        source: TranslationError,
    },
}

impl PipelineError {
    /// Zero-based index of the batch that stopped the run
    pub fn batch_index(&self) -> usize {
        match self {
            Self::BatchFailed { batch_index, .. } => *batch_index,
        }
    }
}

/// Errors that can occur while reading or writing a checkpoint file
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Error from the file system
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding or decoding the checkpoint document
    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the batch pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
