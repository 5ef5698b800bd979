//! GitHub integration - pull request source, comment sink, diff assembly

mod client;
mod diff;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::{GITHUB_API_URL, GitHubClient};
pub use diff::{assemble_diff, truncate_diff};

/// Identifies one pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Pull request metadata used in the review prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub head_ref: String,
    pub base_ref: String,
    pub changed_files: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// One changed file; binary or very large files carry no patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    pub fn new(filename: impl Into<String>, patch: Option<&str>) -> Self {
        Self {
            filename: filename.into(),
            patch: patch.map(String::from),
        }
    }
}

/// Where pull request data comes from
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo>;

    /// Every changed file, across all pages
    async fn changed_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>>;
}

/// Where the finished review goes
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn post(&self, pr: &PullRequestRef, body: &str) -> Result<()>;
}

/// Prints the comment instead of posting it
#[derive(Debug, Default, Clone)]
pub struct DryRunSink;

#[async_trait]
impl CommentSink for DryRunSink {
    async fn post(&self, pr: &PullRequestRef, body: &str) -> Result<()> {
        log::info!("Dry run: not posting review to {}", pr);
        println!("{}", body);
        Ok(())
    }
}
