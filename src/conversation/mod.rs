//! Conversation module - the bounded tool-use loop with the model
//!
//! This module provides:
//! - ConversationLoop driving model turns and tool dispatch
//! - LoopState / ConversationState for the explicit state machine
//! - ConversationOutcome describing how a conversation ended
//! - Markup cleanup for final review text

mod markup;
mod outcome;
mod runner;
mod side_data;
mod state;

pub use markup::strip_tool_simulation_markup;
pub use outcome::{ConversationOutcome, EXHAUSTED_TEXT, FallbackReason, OutcomeStatus, UNEXPECTED_STOP_TEXT};
pub use runner::{ConversationConfig, ConversationError, ConversationLoop};
pub use side_data::IssueSummary;
pub use state::{ConversationState, LoopState};
