use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::ConversationConfig;
use crate::github::GITHUB_API_URL;
use crate::llm::{AnthropicConfig, anthropic};
use crate::prompt::ServerGuidance;
use crate::review::{CommentStyle, ReviewSettings, ServerLabel};
use crate::tools::{CatalogPolicy, ServerEndpoint, ServerSpec, ServerTransport};

const GITHUB_TOOL_GUIDANCE: &str = r#"You have GitHub MCP tools (prefixed with `github_`) for fetching code from other repositories in the organization:
- `github_get_file_contents` - Read specific files from any repository
- `github_search_code` - Search for code patterns across repositories
- `github_get_commit` - Get commit details for context
- `github_list_commits` - List recent commits in a repository

**When to use cross-repo context**:
1. Changes to shared SDKs or libraries: check their consumers
2. API or schema changes: check clients and generated types
3. Template or deployment changes: verify what renders from them

**Guidelines**:
- Only access repositories within the organization
- Validate that API contracts are maintained across repositories
- Don't use GitHub tools for files already in the PR diff"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub conversation: ConversationSettings,
    pub review: ReviewConfig,
    pub github: GitHubConfig,
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub api_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: anthropic::DEFAULT_MODEL.to_string(),
            max_tokens: anthropic::DEFAULT_MAX_TOKENS,
            timeout_ms: 120_000,
            api_url: anthropic::ANTHROPIC_API_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn to_anthropic(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_millis(self.timeout_ms),
            api_url: self.api_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    pub max_turns: u32,
    pub side_data_tool: String,
    pub side_data_description_limit: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_turns: 10,
            side_data_tool: "get_issue".to_string(),
            side_data_description_limit: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub max_diff_lines: usize,
    pub max_file_lines: usize,
    pub max_instruction_length: usize,
    pub guidelines_file: PathBuf,
    pub standards_file: Option<PathBuf>,
    pub trigger: String,
    pub organization: Option<String>,
    pub header: String,
    pub learn_more_url: Option<String>,
    pub issue_url_template: Option<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_diff_lines: 2000,
            max_file_lines: 500,
            max_instruction_length: 2000,
            guidelines_file: PathBuf::from("CLAUDE.md"),
            standards_file: None,
            trigger: "@claude".to_string(),
            organization: None,
            header: "🤖 Claude Code Review".to_string(),
            learn_more_url: None,
            issue_url_template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token_env: String,
    pub timeout_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// What a tool server contributes to the review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    /// Issue tracker used to validate requirements
    Requirements,
    #[default]
    Context,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub label: String,
    pub url: String,
    pub transport: ServerTransport,
    /// Environment variables tried in order; the first non-empty one wins
    pub token_env: Vec<String>,
    pub prefix: Option<String>,
    pub allow: Vec<String>,
    pub timeout_ms: u64,
    pub role: ServerRole,
    pub guidance: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            label: String::new(),
            url: String::new(),
            transport: ServerTransport::default(),
            token_env: Vec::new(),
            prefix: None,
            allow: Vec::new(),
            timeout_ms: 30_000,
            role: ServerRole::default(),
            guidance: None,
        }
    }
}

impl ServerConfig {
    pub fn linear() -> Self {
        Self {
            name: "linear".to_string(),
            label: "Linear".to_string(),
            url: "https://mcp.linear.app/mcp".to_string(),
            token_env: vec!["LINEAR_API_KEY".to_string()],
            role: ServerRole::Requirements,
            ..Default::default()
        }
    }

    pub fn github() -> Self {
        Self {
            name: "github".to_string(),
            label: "Cross-repo".to_string(),
            url: "https://api.githubcopilot.com/mcp/".to_string(),
            token_env: vec!["GITHUB_MCP_TOKEN".to_string(), "GITHUB_TOKEN".to_string()],
            prefix: Some("github_".to_string()),
            allow: ["get_file_contents", "search_code", "get_commit", "list_commits"]
                .into_iter()
                .map(String::from)
                .collect(),
            guidance: Some(GITHUB_TOOL_GUIDANCE.to_string()),
            ..Default::default()
        }
    }

    /// First non-empty credential among `token_env`
    pub fn resolve_credential<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.token_env.iter().filter_map(|var| lookup(var.as_str())).find(|v| !v.is_empty())
    }

    pub fn policy(&self) -> CatalogPolicy {
        let mut policy = CatalogPolicy::default().with_allow(self.allow.iter().cloned());
        if let Some(prefix) = &self.prefix {
            policy = policy.with_prefix(prefix.clone());
        }
        policy
    }

    pub fn to_spec(&self, credential: Option<String>) -> ServerSpec {
        let mut endpoint =
            ServerEndpoint::new(self.name.clone(), self.url.clone()).with_timeout(Duration::from_millis(self.timeout_ms));
        endpoint.transport = self.transport;
        ServerSpec::new(endpoint, credential).with_policy(self.policy())
    }

    fn server_label(&self) -> ServerLabel {
        ServerLabel::new(self.name.clone(), self.label.clone())
    }
}

/// Servers from configuration paired with their credentials
#[derive(Debug, Clone)]
pub struct ResolvedServers {
    pub specs: Vec<ServerSpec>,
    configs: Vec<(ServerConfig, bool)>,
}

impl ResolvedServers {
    fn requirements(&self) -> Option<&(ServerConfig, bool)> {
        self.configs.iter().find(|(c, _)| c.role == ServerRole::Requirements)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            conversation: ConversationSettings::default(),
            review: ReviewConfig::default(),
            github: GitHubConfig::default(),
            servers: vec![ServerConfig::linear(), ServerConfig::github()],
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conversation.max_turns == 0 {
            eyre::bail!("conversation.max_turns must be > 0");
        }
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.name.is_empty() || server.url.is_empty() {
                eyre::bail!("every server needs a name and a url");
            }
            if !seen.insert(server.name.as_str()) {
                eyre::bail!("duplicate server name: {}", server.name);
            }
        }
        if self.servers.iter().filter(|s| s.role == ServerRole::Requirements).count() > 1 {
            eyre::bail!("at most one server may have role 'requirements'");
        }
        Ok(())
    }

    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig {
            max_turns: self.conversation.max_turns,
            side_data_tool: self.conversation.side_data_tool.clone(),
            side_data_description_limit: self.conversation.side_data_description_limit,
            model_timeout: Duration::from_millis(self.llm.timeout_ms),
        }
    }

    /// Pair every configured server with its credential from `lookup`
    pub fn resolve_servers<F>(&self, lookup: F) -> ResolvedServers
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut specs = Vec::with_capacity(self.servers.len());
        let mut configs = Vec::with_capacity(self.servers.len());
        for server in &self.servers {
            let credential = server.resolve_credential(&lookup);
            if credential.is_some() {
                log::info!("{} credential found, {} tools will be requested", server.label, server.name);
            }
            configs.push((server.clone(), credential.is_some()));
            specs.push(server.to_spec(credential));
        }
        ResolvedServers { specs, configs }
    }

    pub fn review_settings(&self, servers: &ResolvedServers, step_summary: Option<PathBuf>) -> ReviewSettings {
        let requirements = servers.requirements();

        let server_guidance = servers
            .configs
            .iter()
            .filter(|(c, present)| *present && c.role == ServerRole::Context)
            .filter_map(|(c, _)| {
                c.guidance.as_ref().map(|g| ServerGuidance {
                    label: c.label.clone(),
                    guidance: g.clone(),
                })
            })
            .collect();

        let style = CommentStyle {
            header: self.review.header.clone(),
            requirements: requirements.map(|(c, _)| c.server_label()),
            context_servers: servers
                .configs
                .iter()
                .filter(|(c, _)| c.role == ServerRole::Context)
                .map(|(c, _)| c.server_label())
                .collect(),
            issue_url_template: self.review.issue_url_template.clone(),
            learn_more_url: self.review.learn_more_url.clone(),
        };

        ReviewSettings {
            max_diff_lines: self.review.max_diff_lines,
            max_file_lines: self.review.max_file_lines,
            max_instruction_length: self.review.max_instruction_length,
            guidelines_file: self.review.guidelines_file.clone(),
            standards_file: self.review.standards_file.clone(),
            trigger: self.review.trigger.clone(),
            organization: self.review.organization.clone(),
            tracker: requirements
                .map(|(c, _)| c.label.clone())
                .unwrap_or_else(|| "issue tracker".to_string()),
            requirements_available: requirements.is_some_and(|(_, present)| *present),
            server_guidance,
            style,
            step_summary,
        }
    }
}
