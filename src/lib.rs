//! pr-reviewer - automated pull request review with an LLM
//!
//! A review gathers the pull request and its diff, renders a cached static
//! prompt plus a per-PR dynamic prompt, and runs a bounded tool-use
//! conversation against the model with tools aggregated from any reachable
//! MCP servers. When tools are unavailable the review degrades to a single
//! toolless call instead of failing.

pub mod config;
pub mod conversation;
pub mod error;
pub mod github;
pub mod llm;
pub mod metrics;
pub mod prompt;
pub mod review;
pub mod tools;

pub use error::{Result, ReviewError};
