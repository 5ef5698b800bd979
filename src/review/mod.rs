//! Review module - degradation policy, comment composition and the pipeline
//!
//! The Reviewer decides whether a review gets tools; the pipeline wires the
//! pull request source, prompt assembly, reviewer and comment sink together.

mod comment;
mod pipeline;
mod policy;

pub use comment::{CommentFooter, CommentStyle, ServerLabel};
pub use pipeline::{ReviewPipeline, ReviewReport, ReviewRequest, ReviewSettings};
pub use policy::Reviewer;
