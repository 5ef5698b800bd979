//! Degradation policy around the tool-use conversation
//!
//! Decides, once per review, whether the model gets tools or a single
//! toolless call, and how failures inside the conversation are handled.

use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::timeout;

use crate::conversation::{
    ConversationConfig, ConversationLoop, ConversationOutcome, FallbackReason, OutcomeStatus, UNEXPECTED_STOP_TEXT,
    strip_tool_simulation_markup,
};
use crate::error::Result;
use crate::llm::{CompletionRequest, ContentBlock, LlmClient, LlmError, Message, StopReason};
use crate::tools::{ServerSpec, SessionManager, SessionStatus, ToolConnector};

/// Runs one review request against the model, with or without tools
pub struct Reviewer<L>
where
    L: LlmClient + ?Sized,
{
    llm: Arc<L>,
    conversation: ConversationConfig,
    servers: Vec<ServerSpec>,
    connector: Option<Arc<dyn ToolConnector>>,
}

impl<L> Reviewer<L>
where
    L: LlmClient + ?Sized,
{
    pub fn new(
        llm: Arc<L>,
        conversation: ConversationConfig,
        servers: Vec<ServerSpec>,
        connector: Option<Arc<dyn ToolConnector>>,
    ) -> Self {
        Self {
            llm,
            conversation,
            servers,
            connector,
        }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// The static block carries the cache hint; the dynamic block does not
    pub fn initial_blocks(static_block: &str, dynamic_block: &str) -> Vec<ContentBlock> {
        vec![ContentBlock::cached_text(static_block), ContentBlock::text(dynamic_block)]
    }

    /// Review with whatever tool context is reachable
    pub async fn review(&self, static_block: &str, dynamic_block: &str) -> Result<ConversationOutcome> {
        let initial = Self::initial_blocks(static_block, dynamic_block);
        let session = SessionManager::connect(&self.servers, self.connector.as_deref()).await;

        match session.status() {
            SessionStatus::NoCredentials => {
                log::info!("No tool server credentials provided, proceeding without tools");
                session.release().await;
                self.single_turn(initial, FallbackReason::NoCredentials).await
            }
            SessionStatus::TransportUnavailable => {
                log::warn!("Tool transport unavailable, proceeding without tools");
                session.release().await;
                self.single_turn(initial, FallbackReason::TransportUnavailable).await
            }
            SessionStatus::NoServersReachable => {
                log::warn!("No tools available from any server, proceeding without tools");
                session.release().await;
                self.single_turn(initial, FallbackReason::NoServersReachable).await
            }
            SessionStatus::Ready => self.converse(session, initial).await,
        }
    }

    async fn converse(&self, session: SessionManager, initial: Vec<ContentBlock>) -> Result<ConversationOutcome> {
        let runner = ConversationLoop::new(self.llm.clone(), self.conversation.clone());

        let result = AssertUnwindSafe(runner.run(initial.clone(), session.catalog(), session.router()))
            .catch_unwind()
            .await;
        let context_flags = session.context_flags().to_vec();

        // Sessions are released however the conversation ended
        session.release().await;

        match result {
            Err(panic) => resume_unwind(panic),
            Ok(Ok(mut outcome)) => {
                outcome.context_flags = context_flags;
                Ok(outcome)
            }
            Ok(Err(e)) if e.source.is_transport() && e.completed_turns > 0 => {
                log::warn!("Conversation interrupted ({}), falling back to review without tools", e);
                self.single_turn(initial, FallbackReason::ConversationInterrupted).await
            }
            Ok(Err(e)) => Err(e.source.into()),
        }
    }

    /// One toolless model call over the original content blocks
    async fn single_turn(&self, initial: Vec<ContentBlock>, fallback: FallbackReason) -> Result<ConversationOutcome> {
        let request = CompletionRequest::new(vec![Message::user(initial)]);
        let limit = self.conversation.model_timeout;
        let response = match timeout(limit, self.llm.complete(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout(limit).into()),
        };

        let raw = response.text();
        let status = match response.stop_reason {
            StopReason::EndTurn => OutcomeStatus::Completed,
            ref other => OutcomeStatus::Aborted(other.as_str().to_string()),
        };
        let raw = if raw.is_empty() && status != OutcomeStatus::Completed {
            UNEXPECTED_STOP_TEXT.to_string()
        } else {
            raw
        };

        log::info!(
            "Single-turn review ({}): {} input, {} output tokens",
            fallback,
            response.usage.input_tokens,
            response.usage.output_tokens
        );

        Ok(ConversationOutcome::single_turn(
            strip_tool_simulation_markup(&raw),
            status,
            response.usage,
            fallback,
        ))
    }
}
