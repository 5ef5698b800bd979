//! Shared mocks for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use pr_reviewer::error::Result;
use pr_reviewer::github::{ChangedFile, CommentSink, PullRequestInfo, PullRequestRef, PullRequestSource};
use pr_reviewer::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, StopReason, Usage};
use pr_reviewer::tools::{
    CatalogPolicy, ServerEndpoint, ServerSpec, ToolConnector, ToolDescriptor, ToolError, ToolOutput, ToolProvider,
};

pub fn end_turn(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: Usage::new(1_000, 200),
    }
}

pub fn tool_use(id: &str, name: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        content: vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
        usage: Usage::new(1_000, 50),
    }
}

/// Replays scripted responses; the last one repeats forever
pub struct ScriptedLlm {
    script: Mutex<VecDeque<std::result::Result<CompletionResponse, LlmError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<std::result::Result<CompletionResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            return script.pop_front().unwrap();
        }
        match script.front() {
            Some(Ok(response)) => Ok(response.clone()),
            _ => Err(LlmError::InvalidResponse("script exhausted".into())),
        }
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// How a fake server behaves on connect
#[derive(Clone)]
pub enum FakeServer {
    Tools(Vec<&'static str>),
    HandshakeFails,
}

pub struct FakeProvider {
    name: String,
    tools: Vec<&'static str>,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    released: Arc<AtomicUsize>,
    replies: HashMap<String, String>,
}

#[async_trait]
impl ToolProvider for FakeProvider {
    fn server(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self
            .tools
            .iter()
            .map(|t| ToolDescriptor::new(*t).with_description(format!("{} tool", t)))
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        match self.replies.get(name) {
            Some(reply) => Ok(ToolOutput::text(reply.clone())),
            None => Err(ToolError::Protocol(format!("{} is broken", name))),
        }
    }

    async fn shutdown(&self) -> std::result::Result<(), ToolError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector over in-memory servers keyed by name
#[derive(Default)]
pub struct FakeConnector {
    servers: HashMap<String, FakeServer>,
    replies: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    pub released: Arc<AtomicUsize>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, name: &str, server: FakeServer) -> Self {
        self.servers.insert(name.to_string(), server);
        self
    }

    pub fn with_reply(mut self, tool: &str, reply: &str) -> Self {
        self.replies.insert(tool.to_string(), reply.to_string());
        self
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolConnector for FakeConnector {
    async fn connect(
        &self,
        endpoint: &ServerEndpoint,
        _credential: &str,
    ) -> std::result::Result<Arc<dyn ToolProvider>, ToolError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.servers.get(&endpoint.name) {
            Some(FakeServer::Tools(tools)) => Ok(Arc::new(FakeProvider {
                name: endpoint.name.clone(),
                tools: tools.clone(),
                calls: self.calls.clone(),
                released: self.released.clone(),
                replies: self.replies.clone(),
            })),
            Some(FakeServer::HandshakeFails) => Err(ToolError::Handshake("bad token".into())),
            None => Err(ToolError::Connection(format!("no route to {}", endpoint.url))),
        }
    }
}

pub fn server(name: &str, credential: Option<&str>) -> ServerSpec {
    ServerSpec::new(
        ServerEndpoint::new(name, format!("https://{}.example/mcp", name)),
        credential.map(String::from),
    )
}

pub fn prefixed_server(name: &str, credential: Option<&str>, prefix: &str) -> ServerSpec {
    server(name, credential).with_policy(CatalogPolicy::default().with_prefix(prefix))
}

/// In-memory pull request with a recording comment sink
pub struct FakeGitHub {
    pub info: PullRequestInfo,
    pub files: Vec<ChangedFile>,
    pub posted: Mutex<Vec<(PullRequestRef, String)>>,
}

impl FakeGitHub {
    pub fn new(title: &str) -> Arc<Self> {
        Arc::new(Self {
            info: PullRequestInfo {
                repository: "acme/api".into(),
                number: 42,
                title: title.into(),
                author: "octocat".into(),
                head_ref: "feature".into(),
                base_ref: "main".into(),
                changed_files: 2,
                additions: 12,
                deletions: 3,
            },
            files: vec![
                ChangedFile::new("app/views.py", Some("@@ -1 +1 @@\n-old\n+new")),
                ChangedFile::new("logo.png", None),
            ],
            posted: Mutex::new(Vec::new()),
        })
    }

    pub fn posted(&self) -> Vec<(PullRequestRef, String)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestSource for FakeGitHub {
    async fn pull_request(&self, _pr: &PullRequestRef) -> Result<PullRequestInfo> {
        Ok(self.info.clone())
    }

    async fn changed_files(&self, _pr: &PullRequestRef) -> Result<Vec<ChangedFile>> {
        Ok(self.files.clone())
    }
}

#[async_trait]
impl CommentSink for FakeGitHub {
    async fn post(&self, pr: &PullRequestRef, body: &str) -> Result<()> {
        self.posted.lock().unwrap().push((pr.clone(), body.to_string()));
        Ok(())
    }
}
