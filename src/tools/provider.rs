//! Tool server connection traits
//!
//! A `ToolConnector` opens a session to one server (connect plus protocol
//! handshake) and hands back a `ToolProvider`. Providers are shared through
//! the router as `Arc<dyn ToolProvider>` and released by the session manager.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Raw tool metadata as advertised by a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Result of a tool call as returned by the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text parts of the result, in server order
    pub parts: Vec<String>,
    /// Server flagged the call as failed
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![text.into()],
            is_error: false,
        }
    }

    /// First text part, if any
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }

    /// All parts joined for feeding back to the model
    pub fn joined(&self) -> String {
        self.parts.join("\n")
    }
}

/// Wire transport used to reach a tool server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerTransport {
    /// MCP over streamable HTTP
    #[default]
    StreamableHttp,
}

/// Where and how to reach one tool server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEndpoint {
    pub name: String,
    pub url: String,
    pub transport: ServerTransport,
    pub timeout: Duration,
}

impl ServerEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            transport: ServerTransport::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Errors at the tool-server boundary
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool transport unavailable: {0}")]
    Unavailable(String),
}

/// Live session with one tool server
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Server name this provider is connected to
    fn server(&self) -> &str;

    /// Tools advertised by the server
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    /// Invoke a tool by its original (unprefixed) name
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// Close the session
    async fn shutdown(&self) -> Result<(), ToolError>;
}

/// Opens sessions to tool servers
#[async_trait]
pub trait ToolConnector: Send + Sync {
    async fn connect(&self, endpoint: &ServerEndpoint, credential: &str) -> Result<Arc<dyn ToolProvider>, ToolError>;
}
