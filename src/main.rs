use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use pr_reviewer::ReviewError;
use pr_reviewer::config::Config;
use pr_reviewer::github::{CommentSink, DryRunSink, GitHubClient, PullRequestSource};
use pr_reviewer::llm::{AnthropicClient, LlmClient};
use pr_reviewer::metrics::STEP_SUMMARY_ENV;
use pr_reviewer::review::{ReviewPipeline, ReviewRequest, Reviewer};
use pr_reviewer::tools;

fn setup_logging(verbose: bool, level: Option<&str>) {
    let default_level = if verbose { "debug" } else { level.unwrap_or("info") };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    let pr = cli.pull_request();
    println!("{} PR #{} in {}", "Reviewing".cyan(), pr.number, pr.full_name());

    let llm = AnthropicClient::new(config.llm.to_anthropic()).context("Failed to create Anthropic client")?;
    info!("Using model {}", llm.model());

    let token = std::env::var(&config.github.token_env).unwrap_or_default();
    if token.is_empty() && !cli.dry_run {
        return Err(ReviewError::MissingCredential(config.github.token_env.clone()).into());
    }
    let github = Arc::new(GitHubClient::new(token, &config.github.api_url, config.github.timeout()).context("Failed to create GitHub client")?);

    let servers = config.resolve_servers(|var| std::env::var(var).ok());
    let step_summary = std::env::var_os(STEP_SUMMARY_ENV).map(PathBuf::from);
    let settings = config.review_settings(&servers, step_summary);

    let reviewer = Reviewer::new(
        Arc::new(llm),
        config.conversation_config(),
        servers.specs,
        tools::default_connector(),
    );

    let source: Arc<dyn PullRequestSource> = github.clone();
    let sink: Arc<dyn CommentSink> = if cli.dry_run { Arc::new(DryRunSink) } else { github };

    let pipeline = ReviewPipeline::new(source, sink, reviewer, settings);
    let report = pipeline
        .run(&ReviewRequest {
            pr: pr.clone(),
            commenter: cli.commenter.clone(),
            comment_body: cli.comment_body.clone(),
        })
        .await
        .context("Review failed")?;

    info!("Review triggered by comment {}", cli.comment_id);
    if let Some(reason) = report.outcome.fallback.filter(|f| f.is_degraded()) {
        println!("{} reviewed without tools ({})", "Warning:".yellow(), reason);
    }
    if !report.outcome.is_complete() {
        println!("{} review did not complete normally", "Warning:".yellow());
    }

    let verb = if cli.dry_run { "Printed" } else { "Posted" };
    println!(
        "{} review for {} ({} tool calls, ${:.4})",
        verb.green(),
        pr,
        report.outcome.tool_call_count,
        report.metrics.total_cost
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_ref()).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            std::process::exit(1);
        }
    };

    setup_logging(cli.is_verbose(), config.log_level.as_deref());
    info!("Starting with config from: {:?}", cli.config);

    if let Err(e) = run_application(&cli, &config).await {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}
