//! Conversation state machine

use crate::llm::{ContentBlock, Message, ToolCall, Usage};

use super::side_data::IssueSummary;

/// Where the loop is between model calls
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Next step is a model call
    AwaitingModel,
    /// Model asked for these tools
    HandlingTools(Vec<ToolCall>),
    /// Final cleaned text
    Done(String),
    /// Turn limit reached
    Exhausted,
    /// Unexpected stop reason with salvaged text
    Aborted { stop_reason: String, text: String },
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done(_) | LoopState::Exhausted | LoopState::Aborted { .. })
    }
}

/// History and counters, mutated only by the loop
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub turn_count: u32,
    pub tool_call_count: u32,
    pub side_data: Option<IssueSummary>,
    pub usage: Usage,
}

impl ConversationState {
    /// Start with the caller's content blocks as the first user turn
    pub fn new(initial: Vec<ContentBlock>) -> Self {
        Self {
            messages: vec![Message::user(initial)],
            turn_count: 0,
            tool_call_count: 0,
            side_data: None,
            usage: Usage::default(),
        }
    }

    /// Keep only the first captured side data
    pub fn capture(&mut self, issue: IssueSummary) -> bool {
        if self.side_data.is_some() {
            return false;
        }
        self.side_data = Some(issue);
        true
    }
}
