//! End-to-end review of one pull request

use std::path::PathBuf;
use std::sync::Arc;

use crate::conversation::ConversationOutcome;
use crate::error::Result;
use crate::github::{CommentSink, PullRequestRef, PullRequestSource, assemble_diff};
use crate::llm::LlmClient;
use crate::metrics::ReviewMetrics;
use crate::prompt::{
    PromptInputs, PromptRenderer, ServerGuidance, build_review_prompt, extract_issue_id,
    extract_reviewer_instructions, read_repository_guidelines, read_review_standards,
};

use super::comment::{CommentFooter, CommentStyle};
use super::policy::Reviewer;

/// Review-wide knobs resolved from configuration
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub max_diff_lines: usize,
    pub max_file_lines: usize,
    pub max_instruction_length: usize,
    pub guidelines_file: PathBuf,
    pub standards_file: Option<PathBuf>,
    /// Mention that requests a review, e.g. `@claude`
    pub trigger: String,
    pub organization: Option<String>,
    /// Display name of the issue tracker
    pub tracker: String,
    /// Whether the issue-tracker server has a credential
    pub requirements_available: bool,
    /// Guidance for context servers that have credentials
    pub server_guidance: Vec<ServerGuidance>,
    pub style: CommentStyle,
    pub step_summary: Option<PathBuf>,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            max_diff_lines: 2000,
            max_file_lines: 500,
            max_instruction_length: 2000,
            guidelines_file: PathBuf::from("CLAUDE.md"),
            standards_file: None,
            trigger: "@claude".to_string(),
            organization: None,
            tracker: "Linear".to_string(),
            requirements_available: false,
            server_guidance: Vec::new(),
            style: CommentStyle::default(),
            step_summary: None,
        }
    }
}

/// What triggered the review
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub pr: PullRequestRef,
    pub commenter: String,
    pub comment_body: String,
}

/// Result of a posted review
#[derive(Debug, Clone)]
pub struct ReviewReport {
    pub outcome: ConversationOutcome,
    pub metrics: ReviewMetrics,
    pub comment: String,
}

/// Fetch, prompt, review, post
pub struct ReviewPipeline<L>
where
    L: LlmClient + ?Sized,
{
    source: Arc<dyn PullRequestSource>,
    sink: Arc<dyn CommentSink>,
    reviewer: Reviewer<L>,
    settings: ReviewSettings,
    renderer: PromptRenderer,
}

impl<L> ReviewPipeline<L>
where
    L: LlmClient + ?Sized,
{
    pub fn new(
        source: Arc<dyn PullRequestSource>,
        sink: Arc<dyn CommentSink>,
        reviewer: Reviewer<L>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            source,
            sink,
            reviewer,
            settings,
            renderer: PromptRenderer::new(),
        }
    }

    pub async fn run(&self, request: &ReviewRequest) -> Result<ReviewReport> {
        let settings = &self.settings;
        log::info!("Reviewing PR {}", request.pr);

        let pr = self.source.pull_request(&request.pr).await?;
        let files = self.source.changed_files(&request.pr).await?;
        log::info!("Fetched {} changed files", files.len());

        let diff = assemble_diff(&files, settings.max_file_lines, settings.max_diff_lines);

        let issue_id = extract_issue_id(&pr.title);
        match &issue_id {
            Some(id) => log::info!("Found {} issue: {}", settings.tracker, id),
            None => log::info!("No {} issue ID in PR title", settings.tracker),
        }

        let instructions =
            extract_reviewer_instructions(&request.comment_body, &settings.trigger, settings.max_instruction_length);
        if !instructions.is_empty() {
            log::info!("Reviewer instructions: {} chars", instructions.chars().count());
        }

        let guidelines = read_repository_guidelines(&settings.guidelines_file);
        let standards = read_review_standards(settings.standards_file.as_deref());

        let prompt = build_review_prompt(
            &self.renderer,
            &PromptInputs {
                pr: &pr,
                files: &files,
                diff: &diff,
                issue_id: issue_id.as_deref(),
                repository_guidelines: &guidelines,
                review_standards: &standards,
                reviewer_instructions: &instructions,
                organization: settings.organization.as_deref(),
                tracker: &settings.tracker,
                requirements_tools: settings.requirements_available,
                servers: settings.server_guidance.clone(),
            },
        )?;
        log::debug!(
            "Static prompt {} chars (fingerprint {}), dynamic prompt {} chars",
            prompt.static_block.len(),
            prompt.static_fingerprint(),
            prompt.dynamic_block.len()
        );

        let outcome = self.reviewer.review(&prompt.static_block, &prompt.dynamic_block).await?;
        if outcome.is_degraded() {
            log::warn!(
                "Review degraded: {}",
                outcome.fallback.map(|f| f.as_str()).unwrap_or_default()
            );
        }
        if !outcome.is_complete() {
            log::warn!("Review did not complete normally: {:?}", outcome.status);
        }

        let metrics = ReviewMetrics::from_usage(&outcome.usage, outcome.tool_call_count);
        metrics.log();
        if let Some(path) = &settings.step_summary {
            metrics.append_step_summary(path);
        }

        let comment = settings.style.compose(
            &outcome,
            &CommentFooter {
                commenter: &request.commenter,
                model: self.reviewer.model(),
                cost: metrics.total_cost,
            },
        );
        self.sink.post(&request.pr, &comment).await?;
        log::info!("Posted review comment to {}", request.pr);

        Ok(ReviewReport {
            outcome,
            metrics,
            comment,
        })
    }
}
