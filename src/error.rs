//! Error types for pr-reviewer
//!
//! Centralized error handling using thiserror. Boundary-specific errors
//! (`LlmError`, `ToolError`) live next to their traits and convert into
//! `ReviewError` where they escape to the caller.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can escape a review request
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Required credential missing from the environment
    #[error("Missing credential: environment variable {0} not set")]
    MissingCredential(String),

    /// GitHub REST API returned a non-success status
    #[error("GitHub API error {status}: {message}")]
    GitHub { status: u16, message: String },

    /// HTTP transport error outside the model boundary
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Model API error that could not be degraded around
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Prompt template rendering failed
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;
