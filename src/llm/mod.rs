//! LLM Client Layer - Anthropic Messages API integration
//!
//! This module provides:
//! - Content-block message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, LlmError};
pub use types::{
    CacheControl, CompletionRequest, CompletionResponse, ContentBlock, Message, Role, StopReason, ToolCall,
    ToolDefinition, ToolResult, Usage,
};
