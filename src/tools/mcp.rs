//! MCP over streamable HTTP
//!
//! Sessions are opened with rmcp's streamable HTTP client transport using a
//! bearer token. Tool metadata and results are read through their JSON form
//! so only the wire shape matters here.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    RoleClient, ServiceExt,
    model::CallToolRequestParam,
    service::{Peer, RunningService},
    transport::{StreamableHttpClientTransport, streamable_http_client::StreamableHttpClientTransportConfig},
};
use serde_json::Value;
use tokio::sync::Mutex;

use super::provider::{ServerEndpoint, ServerTransport, ToolConnector, ToolDescriptor, ToolError, ToolOutput, ToolProvider};

/// Opens MCP sessions over streamable HTTP
#[derive(Debug, Default, Clone)]
pub struct McpHttpConnector;

impl McpHttpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolConnector for McpHttpConnector {
    async fn connect(&self, endpoint: &ServerEndpoint, credential: &str) -> Result<Arc<dyn ToolProvider>, ToolError> {
        match endpoint.transport {
            ServerTransport::StreamableHttp => {}
        }

        let mut cfg = StreamableHttpClientTransportConfig::with_uri(endpoint.url.as_str());
        cfg.auth_header = Some(credential.to_string());
        let transport = StreamableHttpClientTransport::from_config(cfg);

        // serve() performs the initialize handshake
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ToolError::Handshake(format!("{}: {}", endpoint.url, e)))?;
        let peer = service.peer().clone();

        Ok(Arc::new(McpHttpProvider {
            server: endpoint.name.clone(),
            peer,
            service: Mutex::new(Some(service)),
        }))
    }
}

/// Live MCP session with one server
pub struct McpHttpProvider {
    server: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl std::fmt::Debug for McpHttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpHttpProvider").field("server", &self.server).finish()
    }
}

#[async_trait]
impl ToolProvider for McpHttpProvider {
    fn server(&self) -> &str {
        &self.server
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| ToolError::Protocol(e.to_string()))?;

        tools
            .iter()
            .map(|tool| {
                let value = serde_json::to_value(tool).map_err(|e| ToolError::Protocol(e.to_string()))?;
                Ok(descriptor_from_json(&value))
            })
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(ToolError::Protocol(format!(
                    "tool arguments must be an object, got {}",
                    other
                )));
            }
        };

        let request = CallToolRequestParam {
            name: Cow::Owned(name.to_string()),
            arguments,
        };

        let result = self
            .peer
            .call_tool(request)
            .await
            .map_err(|e| ToolError::Connection(e.to_string()))?;

        let value = serde_json::to_value(&result).map_err(|e| ToolError::Protocol(e.to_string()))?;
        Ok(output_from_json(&value))
    }

    async fn shutdown(&self) -> Result<(), ToolError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        service
            .cancel()
            .await
            .map(|_| ())
            .map_err(|e| ToolError::Connection(e.to_string()))
    }
}

fn descriptor_from_json(value: &Value) -> ToolDescriptor {
    ToolDescriptor {
        name: value["name"].as_str().unwrap_or_default().to_string(),
        description: value["description"].as_str().map(String::from),
        input_schema: value.get("inputSchema").filter(|v| v.is_object()).cloned(),
    }
}

fn output_from_json(value: &Value) -> ToolOutput {
    let parts = value["content"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| match item["text"].as_str() {
                    Some(text) => text.to_string(),
                    None => item.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    ToolOutput {
        parts,
        is_error: value["isError"].as_bool().unwrap_or(false),
    }
}
