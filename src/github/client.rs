//! GitHub REST client
//!
//! Fetches pull request metadata and changed files, and posts issue
//! comments, using a token from the environment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ReviewError};

use super::{ChangedFile, CommentSink, PullRequestInfo, PullRequestRef, PullRequestSource};

/// GitHub REST API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;

/// GitHub caps the files listing at 3000 entries
const MAX_PAGES: usize = 30;

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    repo: Option<RawRepo>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    user: RawUser,
    head: RawBranch,
    base: RawBranch,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

/// GitHub REST API client
pub struct GitHubClient {
    client: Client,
    token: String,
    api_url: String,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client against the given API base URL
    ///
    /// `timeout` bounds every request, including each files page.
    pub fn new(token: impl Into<String>, api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self {
            client,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn repo_url(&self, pr: &PullRequestRef) -> String {
        format!("{}/repos/{}/{}", self.api_url, pr.owner, pr.repo)
    }

    /// Anonymous when no token is configured (public repositories, dry runs)
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION);
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    /// Turn non-2xx responses into `ReviewError::GitHub`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(String::from))
            .unwrap_or(body);
        Err(ReviewError::GitHub {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo> {
        let url = format!("{}/pulls/{}", self.repo_url(pr), pr.number);
        let response = self.authorized(self.client.get(&url)).send().await?;
        let raw: RawPullRequest = Self::check(response).await?.json().await?;

        Ok(PullRequestInfo {
            repository: raw
                .base
                .repo
                .map(|r| r.full_name)
                .unwrap_or_else(|| pr.full_name()),
            number: raw.number,
            title: raw.title,
            author: raw.user.login,
            head_ref: raw.head.git_ref,
            base_ref: raw.base.git_ref,
            changed_files: raw.changed_files,
            additions: raw.additions,
            deletions: raw.deletions,
        })
    }

    async fn changed_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>> {
        let url = format!("{}/pulls/{}/files", self.repo_url(pr), pr.number);
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            let response = self
                .authorized(self.client.get(&url))
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<ChangedFile> = Self::check(response).await?.json().await?;
            let done = batch.len() < PER_PAGE;
            files.extend(batch);
            if done {
                break;
            }
        }

        log::debug!("Fetched {} changed files for {}", files.len(), pr);
        Ok(files)
    }
}

#[async_trait]
impl CommentSink for GitHubClient {
    async fn post(&self, pr: &PullRequestRef, body: &str) -> Result<()> {
        let url = format!("{}/issues/{}/comments", self.repo_url(pr), pr.number);
        let response = self
            .authorized(self.client.post(&url))
            .json(&json!({ "body": body }))
            .send()
            .await?;
        Self::check(response).await?;
        log::info!("Posted review comment to {}", pr);
        Ok(())
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url_trims_slash() {
        let client = GitHubClient::new("t", "https://ghe.example.com/api/v3/", Duration::from_secs(5)).unwrap();
        let pr = PullRequestRef::new("acme", "api", 7);
        assert_eq!(client.repo_url(&pr), "https://ghe.example.com/api/v3/repos/acme/api");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GitHubClient::new("ghp_secret", GITHUB_API_URL, Duration::from_secs(30)).unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("timeout: 30s"));
    }

    #[test]
    fn test_raw_pull_request_parses() {
        let raw: RawPullRequest = serde_json::from_value(json!({
            "number": 12,
            "title": "ENG-1 Add login",
            "user": { "login": "octocat" },
            "head": { "ref": "feature", "repo": { "full_name": "fork/api" } },
            "base": { "ref": "main", "repo": { "full_name": "acme/api" } },
            "changed_files": 3,
            "additions": 10,
            "deletions": 2
        }))
        .unwrap();
        assert_eq!(raw.head.git_ref, "feature");
        assert_eq!(raw.base.repo.unwrap().full_name, "acme/api");
        assert_eq!(raw.user.login, "octocat");
    }
}
