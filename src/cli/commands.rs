//! CLI argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use pr_reviewer::github::PullRequestRef;

/// pr-reviewer - LLM code review for a pull request
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pull request number
    #[arg(long)]
    pub pr_number: u64,

    /// Repository owner (user or organization)
    #[arg(long)]
    pub repo_owner: String,

    /// Repository name
    #[arg(long)]
    pub repo_name: String,

    /// ID of the comment that triggered the review
    #[arg(long)]
    pub comment_id: u64,

    /// Login of the user who requested the review
    #[arg(long)]
    pub commenter: String,

    /// Body of the triggering comment, searched for reviewer instructions
    #[arg(long, default_value = "")]
    pub comment_body: String,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the review instead of posting it
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn pull_request(&self) -> PullRequestRef {
        PullRequestRef::new(self.repo_owner.clone(), self.repo_name.clone(), self.pr_number)
    }
}
