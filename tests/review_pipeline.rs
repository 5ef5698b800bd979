//! Pipeline integration tests: PR source through to the posted comment

mod common;

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use common::{FakeConnector, FakeGitHub, FakeServer, ScriptedLlm, end_turn, tool_use};
use pr_reviewer::config::Config;
use pr_reviewer::github::{CommentSink, PullRequestRef, PullRequestSource};
use pr_reviewer::llm::ContentBlock;
use pr_reviewer::review::{ReviewPipeline, ReviewRequest, Reviewer};
use pr_reviewer::tools::ToolConnector;

struct Fixture {
    _dir: TempDir,
    summary: std::path::PathBuf,
    config: Config,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let guidelines = dir.path().join("CLAUDE.md");
    std::fs::write(&guidelines, "Always use type hints").unwrap();

    let mut config = Config::default();
    config.review.guidelines_file = guidelines;
    config.review.organization = Some("Acme".into());
    config.review.issue_url_template = Some("https://linear.app/acme/issue/{id_lower}".into());

    Fixture {
        summary: dir.path().join("summary.md"),
        _dir: dir,
        config,
    }
}

fn request(comment: &str) -> ReviewRequest {
    ReviewRequest {
        pr: PullRequestRef::new("acme", "api", 42),
        commenter: "alice".into(),
        comment_body: comment.into(),
    }
}

fn pipeline(
    fx: &Fixture,
    env: &[(&str, &str)],
    llm: Arc<ScriptedLlm>,
    connector: FakeConnector,
    github: Arc<FakeGitHub>,
) -> ReviewPipeline<ScriptedLlm> {
    let env: Vec<(String, String)> = env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let servers = fx
        .config
        .resolve_servers(|key| env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()));
    let settings = fx.config.review_settings(&servers, Some(fx.summary.clone()));

    let connector: Arc<dyn ToolConnector> = Arc::new(connector);
    let reviewer = Reviewer::new(llm, fx.config.conversation_config(), servers.specs, Some(connector));

    let source: Arc<dyn PullRequestSource> = github.clone();
    let sink: Arc<dyn CommentSink> = github;
    ReviewPipeline::new(source, sink, reviewer, settings)
}

#[tokio::test]
async fn test_review_with_issue_context() {
    let fx = fixture();
    let llm = ScriptedLlm::new(vec![
        Ok(tool_use("t1", "get_issue", json!({"id": "ENG-7"}))),
        Ok(end_turn("## Summary\nMatches ENG-7")),
    ]);
    let connector = FakeConnector::new()
        .with_server("linear", FakeServer::Tools(vec!["get_issue"]))
        .with_reply(
            "get_issue",
            r#"{"identifier":"ENG-7","title":"Login","state":{"name":"In Progress"},"description":"Add login"}"#,
        );
    let github = FakeGitHub::new("ENG-7 Add login");
    let pipeline = pipeline(&fx, &[("LINEAR_API_KEY", "lin")], llm.clone(), connector, github.clone());

    let report = pipeline.run(&request("@claude focus on auth")).await.unwrap();

    // prompt
    let first = llm.request(0);
    let blocks = &first.messages[0].content;
    assert_eq!(blocks.len(), 2);
    assert!(matches!(&blocks[0], ContentBlock::Text { cache_control: Some(_), .. }));
    let static_block = blocks[0].as_text().unwrap();
    let dynamic_block = blocks[1].as_text().unwrap();
    assert!(static_block.contains("You are an expert code reviewer for Acme."));
    assert!(static_block.contains("Always use type hints"));
    assert!(static_block.contains("**Use your Linear tools**"));
    assert!(dynamic_block.contains("The PR references Linear issue **ENG-7**."));
    assert!(dynamic_block.contains("> focus on auth"));
    assert!(dynamic_block.contains("--- a/app/views.py\n+++ b/app/views.py\n@@ -1 +1 @@"));
    assert!(!dynamic_block.contains("logo.png"));
    assert_eq!(first.tools.len(), 1);

    // comment
    let posted = github.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0.to_string(), "acme/api#42");
    let body = &posted[0].1;
    assert_eq!(body, &report.comment);
    assert!(body.starts_with("## 🤖 Claude Code Review\n\n## Summary\nMatches ENG-7\n\n---\n"));
    assert!(!body.contains("Unable to fetch"));
    assert!(body.contains("Triggered by @alice | Powered by scripted-model"));
    assert!(body.contains("Reviewed [ENG-7](https://linear.app/acme/issue/eng-7) (1 query)"));

    // metrics
    assert_eq!(report.metrics.usage.input_tokens, 2_000);
    let summary = std::fs::read_to_string(&fx.summary).unwrap();
    assert!(summary.contains("| Input tokens | 2000"));
    assert!(summary.contains("| Tool queries | 1 |"));
}

#[tokio::test]
async fn test_review_without_credentials_warns() {
    let fx = fixture();
    let llm = ScriptedLlm::new(vec![Ok(end_turn("<get_issue id=\"ENG-7\"/>\n## Summary\nOk"))]);
    let github = FakeGitHub::new("Add login");
    let pipeline = pipeline(&fx, &[], llm.clone(), FakeConnector::new(), github.clone());

    let report = pipeline.run(&request("@claude")).await.unwrap();

    assert_eq!(llm.call_count(), 1);
    let static_block = llm.request(0).messages[0].content[0].as_text().unwrap().to_string();
    assert!(static_block.contains("Do NOT simulate tool usage"));
    assert!(!llm.request(0).messages[0].content[1].as_text().unwrap().contains("# Reviewer Instructions"));

    let body = &github.posted()[0].1;
    assert!(body.contains("## Summary\nOk"));
    assert!(!body.contains("<get_issue"));
    assert!(body.contains("⚠️ **Linear Context**: Unable to fetch Linear issue context."));
    assert!(!body.contains("Cross-repo context enabled"));
    assert!(!report.outcome.is_degraded());
}

#[tokio::test]
async fn test_review_with_cross_repo_context() {
    let fx = fixture();
    let llm = ScriptedLlm::new(vec![Ok(end_turn("Fine"))]);
    let connector = FakeConnector::new().with_server(
        "github",
        FakeServer::Tools(vec!["get_file_contents", "create_issue", "search_code"]),
    );
    let github = FakeGitHub::new("Add login");
    let pipeline = pipeline(&fx, &[("GITHUB_TOKEN", "gh")], llm.clone(), connector, github.clone());

    let report = pipeline.run(&request("")).await.unwrap();

    let names: Vec<String> = llm.request(0).tools.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, vec!["github_get_file_contents", "github_search_code"]);
    let static_block = llm.request(0).messages[0].content[0].as_text().unwrap().to_string();
    assert!(static_block.contains("## Cross-repo Context"));

    assert_eq!(report.outcome.context_flags, vec!["github".to_string()]);
    let body = &github.posted()[0].1;
    assert!(body.contains("Cross-repo context enabled"));
    // no tracker credential, so the warning stays
    assert!(body.contains("Unable to fetch Linear issue context"));
}

#[tokio::test]
async fn test_unreachable_servers_still_post() {
    let fx = fixture();
    let llm = ScriptedLlm::new(vec![Ok(end_turn("Reviewed anyway"))]);
    let connector = FakeConnector::new().with_server("linear", FakeServer::HandshakeFails);
    let github = FakeGitHub::new("ENG-9 Fix");
    let pipeline = pipeline(&fx, &[("LINEAR_API_KEY", "lin")], llm, connector, github.clone());

    let report = pipeline.run(&request("")).await.unwrap();

    assert!(report.outcome.is_degraded());
    assert_eq!(github.posted().len(), 1);
    assert!(github.posted()[0].1.contains("Reviewed anyway"));
}
