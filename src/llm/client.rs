//! Model client trait and its error type

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call carries the full conversation history
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl LlmError {
    /// Transport-class failures: the request never produced a usable answer
    /// because the connection broke or the deadline expired
    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transport() {
        let err = LlmError::Timeout(Duration::from_secs(120));
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Model call timed out after 120s");
    }

    #[test]
    fn test_api_error_is_not_transport() {
        let err = LlmError::ApiError {
            status: 529,
            message: "overloaded".to_string(),
        };
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "API error 529: overloaded");
    }

    #[test]
    fn test_rate_limit() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(!err.is_transport());
    }

    #[test]
    fn test_missing_api_key_display() {
        let err = LlmError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing API key: environment variable ANTHROPIC_API_KEY not set"
        );
        assert!(!err.is_transport());
    }
}
