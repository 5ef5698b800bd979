//! Result of one review conversation

use serde::Serialize;

use crate::llm::Usage;

use super::side_data::IssueSummary;

/// Text used when the turn limit is hit before the model finishes
pub const EXHAUSTED_TEXT: &str = "Review incomplete: maximum conversation turns exceeded";

/// Text used when the model stops for an unexpected reason without any text
pub const UNEXPECTED_STOP_TEXT: &str = "Review completed with unexpected stop reason";

/// How the conversation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "stop_reason", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Model finished its turn normally
    Completed,
    /// Model stopped for a reason other than finishing or requesting tools
    Aborted(String),
    /// Turn limit reached
    Exhausted,
}

/// Which degradation rule produced the outcome, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No tool server had a credential
    NoCredentials,
    /// Credentials were present but no server contributed tools
    NoServersReachable,
    /// Tool transport not compiled in
    TransportUnavailable,
    /// Model transport failed mid-conversation
    ConversationInterrupted,
}

impl FallbackReason {
    /// Whether tool context was expected but lost
    pub fn is_degraded(&self) -> bool {
        !matches!(self, FallbackReason::NoCredentials)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::NoCredentials => "no_credentials",
            FallbackReason::NoServersReachable => "no_servers_reachable",
            FallbackReason::TransportUnavailable => "transport_unavailable",
            FallbackReason::ConversationInterrupted => "conversation_interrupted",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a review conversation produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationOutcome {
    pub text: String,
    pub status: OutcomeStatus,
    pub turns_used: u32,
    pub tool_call_count: u32,
    /// Servers whose tools were available to the model
    pub context_flags: Vec<String>,
    pub side_data: Option<IssueSummary>,
    /// Usage summed over every model call
    pub usage: Usage,
    pub fallback: Option<FallbackReason>,
}

impl ConversationOutcome {
    /// Outcome of a toolless single model call
    pub fn single_turn(text: String, status: OutcomeStatus, usage: Usage, fallback: FallbackReason) -> Self {
        Self {
            text,
            status,
            turns_used: 1,
            tool_call_count: 0,
            context_flags: Vec::new(),
            side_data: None,
            usage,
            fallback: Some(fallback),
        }
    }

    /// Whether the posted review is missing context it should have had
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some_and(|f| f.is_degraded())
    }

    pub fn is_complete(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }

    pub fn had_context(&self, server: &str) -> bool {
        self.context_flags.iter().any(|s| s == server)
    }
}
