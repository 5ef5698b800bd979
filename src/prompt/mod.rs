//! Prompt System - Review prompt construction
//!
//! Detects the technology stack, reads repository guidelines, pulls reviewer
//! instructions out of the triggering comment, and renders the static and
//! dynamic prompt blocks with Handlebars.

mod guidelines;
mod instructions;
mod render;
mod stack;
mod templates;

pub use guidelines::{NO_GUIDELINES, read_repository_guidelines, read_review_standards};
pub use instructions::{extract_issue_id, extract_reviewer_instructions};
pub use render::PromptRenderer;
pub use stack::TechStack;
pub use templates::{PromptInputs, ReviewPrompt, ServerGuidance, build_review_prompt};
