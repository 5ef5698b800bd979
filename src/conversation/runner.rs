//! Tool-use conversation loop
//!
//! Calls the model with the full history and catalog, runs any requested
//! tools through the router, and repeats until the model finishes, stops
//! unexpectedly, or the turn limit is reached.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, StopReason, ToolCall, ToolResult};
use crate::tools::{Dispatch, ToolCatalog, ToolRouter};

use super::markup::strip_tool_simulation_markup;
use super::outcome::{ConversationOutcome, EXHAUSTED_TEXT, OutcomeStatus, UNEXPECTED_STOP_TEXT};
use super::side_data::IssueSummary;
use super::state::{ConversationState, LoopState};

/// Configuration for the conversation loop
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub max_turns: u32,
    /// Original name of the tool whose result is captured as an issue summary
    pub side_data_tool: String,
    pub side_data_description_limit: usize,
    pub model_timeout: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            side_data_tool: "get_issue".to_string(),
            side_data_description_limit: 200,
            model_timeout: Duration::from_secs(120),
        }
    }
}

/// A model call failed inside the loop
#[derive(Debug, Error)]
#[error("model call failed after {completed_turns} completed turns: {source}")]
pub struct ConversationError {
    pub source: LlmError,
    /// Model calls that returned before the failure
    pub completed_turns: u32,
}

/// Drives one conversation against a model client
pub struct ConversationLoop<L>
where
    L: LlmClient + ?Sized,
{
    llm: Arc<L>,
    config: ConversationConfig,
}

impl<L> ConversationLoop<L>
where
    L: LlmClient + ?Sized,
{
    pub fn new(llm: Arc<L>, config: ConversationConfig) -> Self {
        Self { llm, config }
    }

    /// Run until a terminal state
    ///
    /// Context flags are left empty; the caller knows which servers
    /// contributed to the catalog.
    pub async fn run(
        &self,
        initial: Vec<ContentBlock>,
        catalog: &ToolCatalog,
        router: &ToolRouter,
    ) -> Result<ConversationOutcome, ConversationError> {
        let mut state = ConversationState::new(initial);
        let mut phase = LoopState::AwaitingModel;

        while !phase.is_terminal() {
            phase = match phase {
                LoopState::AwaitingModel => self.model_turn(&mut state, catalog).await?,
                LoopState::HandlingTools(calls) => {
                    self.handle_tools(&mut state, router, calls).await;
                    LoopState::AwaitingModel
                }
                terminal => terminal,
            };
        }

        let (text, status) = match phase {
            LoopState::Done(text) => (text, OutcomeStatus::Completed),
            LoopState::Aborted { stop_reason, text } => (text, OutcomeStatus::Aborted(stop_reason)),
            _ => (EXHAUSTED_TEXT.to_string(), OutcomeStatus::Exhausted),
        };

        tracing::info!(
            turns = state.turn_count,
            tool_calls = state.tool_call_count,
            status = ?status,
            "Conversation finished"
        );

        Ok(ConversationOutcome {
            text,
            status,
            turns_used: state.turn_count,
            tool_call_count: state.tool_call_count,
            context_flags: Vec::new(),
            side_data: state.side_data,
            usage: state.usage,
            fallback: None,
        })
    }

    async fn model_turn(&self, state: &mut ConversationState, catalog: &ToolCatalog) -> Result<LoopState, ConversationError> {
        if state.turn_count >= self.config.max_turns {
            tracing::warn!(max_turns = self.config.max_turns, "Maximum conversation turns reached");
            return Ok(LoopState::Exhausted);
        }

        let completed_turns = state.turn_count;
        state.turn_count += 1;
        tracing::info!(turn = state.turn_count, "Model call");

        let request = CompletionRequest::new(state.messages.clone()).with_tools(catalog.definitions());
        let response = self
            .complete(request)
            .await
            .map_err(|source| ConversationError { source, completed_turns })?;

        log_usage(&response);
        state.usage.add(&response.usage);
        state.messages.push(Message::assistant(response.content.clone()));

        let next = match &response.stop_reason {
            StopReason::EndTurn => LoopState::Done(strip_tool_simulation_markup(&response.text())),
            StopReason::ToolUse => {
                let calls = response.tool_calls();
                if calls.is_empty() {
                    salvage(&response)
                } else {
                    LoopState::HandlingTools(calls)
                }
            }
            _ => salvage(&response),
        };
        Ok(next)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match timeout(self.config.model_timeout, self.llm.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.config.model_timeout)),
        }
    }

    /// Run each call in request order and append one result per call
    async fn handle_tools(&self, state: &mut ConversationState, router: &ToolRouter, calls: Vec<ToolCall>) {
        let mut results: Vec<ContentBlock> = Vec::with_capacity(calls.len());

        for call in calls {
            state.tool_call_count += 1;
            tracing::info!(tool = %call.name, "Executing tool");

            let result = match router.dispatch(&call.name, call.input.clone()).await {
                Dispatch::Unknown => {
                    tracing::warn!(tool = %call.name, "Unknown tool");
                    ToolResult::error(call.id, format!("Unknown tool: {}", call.name))
                }
                Dispatch::Failed { error, .. } => {
                    tracing::warn!(tool = %call.name, error = %error, "Tool failed");
                    ToolResult::error(call.id, format!("Error executing tool: {}", error))
                }
                Dispatch::Completed { original_name, output } => {
                    if !output.is_error && original_name == self.config.side_data_tool {
                        self.capture_side_data(state, output.first_text());
                    }
                    let content = output.joined();
                    if output.is_error {
                        ToolResult::error(call.id, content)
                    } else {
                        ToolResult::success(call.id, content)
                    }
                }
            };
            results.push(result.into());
        }

        state.messages.push(Message::user(results));
    }

    fn capture_side_data(&self, state: &mut ConversationState, text: Option<&str>) {
        if state.side_data.is_some() {
            return;
        }
        match text.and_then(|t| IssueSummary::from_tool_text(t, self.config.side_data_description_limit)) {
            Some(issue) => {
                tracing::info!(issue = %issue.id, title = %issue.title, "Captured issue details");
                state.capture(issue);
            }
            None => tracing::warn!("Could not parse issue details from tool result"),
        }
    }
}

fn salvage(response: &CompletionResponse) -> LoopState {
    let stop_reason = response.stop_reason.as_str().to_string();
    tracing::warn!(stop_reason = %stop_reason, "Unexpected stop reason");

    let raw = response.text();
    let raw = if raw.is_empty() { UNEXPECTED_STOP_TEXT.to_string() } else { raw };
    LoopState::Aborted {
        stop_reason,
        text: strip_tool_simulation_markup(&raw),
    }
}

fn log_usage(response: &CompletionResponse) {
    let usage = &response.usage;
    tracing::info!(input = usage.input_tokens, output = usage.output_tokens, "Tokens");
    if usage.cache_creation_input_tokens > 0 {
        tracing::debug!(tokens = usage.cache_creation_input_tokens, "Cache created");
    }
    if usage.cache_read_input_tokens > 0 {
        tracing::debug!(tokens = usage.cache_read_input_tokens, "Cache hit");
    }
}
