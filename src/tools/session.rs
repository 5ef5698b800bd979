//! Multi-server session management
//!
//! Opens one session per configured tool server that has a credential,
//! merges their tools into a single catalog and router, and releases every
//! session it opened when the conversation is over.

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::timeout;

use super::catalog::{CatalogPolicy, ToolCatalog, build_catalog};
use super::provider::{ServerEndpoint, ToolConnector, ToolDescriptor, ToolError, ToolProvider};
use super::router::ToolRouter;

/// One server the session manager should try
#[derive(Clone)]
pub struct ServerSpec {
    pub endpoint: ServerEndpoint,
    pub credential: Option<String>,
    pub policy: CatalogPolicy,
}

impl ServerSpec {
    pub fn new(endpoint: ServerEndpoint, credential: Option<String>) -> Self {
        Self {
            endpoint,
            credential: credential.filter(|c| !c.is_empty()),
            policy: CatalogPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CatalogPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl std::fmt::Debug for ServerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSpec")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("policy", &self.policy)
            .finish()
    }
}

/// What the connection phase produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// At least one server contributed tools
    Ready,
    /// No server had a credential, nothing was attempted
    NoCredentials,
    /// Every attempted server failed or contributed nothing
    NoServersReachable,
    /// Tool transport is not compiled in
    TransportUnavailable,
}

/// Result of one server's connection attempt
struct Attempt {
    provider: Option<Arc<dyn ToolProvider>>,
    tools: Result<Vec<ToolDescriptor>, ToolError>,
}

/// Owns the sessions, catalog and router for one conversation
pub struct SessionManager {
    catalog: ToolCatalog,
    router: ToolRouter,
    context_flags: Vec<String>,
    providers: Vec<Arc<dyn ToolProvider>>,
    status: SessionStatus,
}

impl SessionManager {
    /// Empty manager with the given status
    pub fn empty(status: SessionStatus) -> Self {
        Self {
            catalog: ToolCatalog::new(),
            router: ToolRouter::new(),
            context_flags: Vec::new(),
            providers: Vec::new(),
            status,
        }
    }

    /// Connect to every server with a credential; never fails
    pub async fn connect(specs: &[ServerSpec], connector: Option<&dyn ToolConnector>) -> Self {
        for spec in specs.iter().filter(|s| s.credential.is_none()) {
            tracing::debug!(server = %spec.endpoint.name, "No credential, skipping tool server");
        }

        let attempted: Vec<&ServerSpec> = specs.iter().filter(|s| s.credential.is_some()).collect();
        if attempted.is_empty() {
            return Self::empty(SessionStatus::NoCredentials);
        }

        let Some(connector) = connector else {
            tracing::warn!("Tool transport unavailable, proceeding without tools");
            return Self::empty(SessionStatus::TransportUnavailable);
        };

        let attempts = join_all(attempted.iter().map(|spec| Self::attempt(connector, spec))).await;

        let mut manager = Self::empty(SessionStatus::NoServersReachable);
        for (spec, attempt) in attempted.into_iter().zip(attempts) {
            manager.merge(spec, attempt);
        }

        if !manager.catalog.is_empty() {
            manager.status = SessionStatus::Ready;
            tracing::info!(tools = manager.catalog.len(), "Total tools available");
        }
        manager
    }

    async fn attempt(connector: &dyn ToolConnector, spec: &ServerSpec) -> Attempt {
        let endpoint = &spec.endpoint;
        let credential = spec.credential.as_deref().unwrap_or_default();
        tracing::info!(server = %endpoint.name, url = %endpoint.url, "Connecting to tool server");

        let provider = match timeout(endpoint.timeout, connector.connect(endpoint, credential)).await {
            Ok(Ok(provider)) => provider,
            Ok(Err(e)) => {
                return Attempt {
                    provider: None,
                    tools: Err(e),
                };
            }
            Err(_) => {
                return Attempt {
                    provider: None,
                    tools: Err(ToolError::Timeout(endpoint.timeout)),
                };
            }
        };

        let tools = match timeout(endpoint.timeout, provider.list_tools()).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(endpoint.timeout)),
        };

        Attempt {
            provider: Some(provider),
            tools,
        }
    }

    fn merge(&mut self, spec: &ServerSpec, attempt: Attempt) {
        let server = spec.endpoint.name.as_str();

        // Keep every opened session for release, even if listing failed
        if let Some(provider) = &attempt.provider {
            self.providers.push(provider.clone());
        }

        let (provider, descriptors) = match (attempt.provider, attempt.tools) {
            (Some(provider), Ok(descriptors)) => (provider, descriptors),
            (_, Err(e)) => {
                tracing::warn!(server = %server, error = %e, "Tool server unavailable");
                return;
            }
            (None, Ok(_)) => return,
        };

        let advertised = descriptors.len();
        let mut added = 0;
        for entry in build_catalog(&descriptors, server, &spec.policy) {
            if self.catalog.get(&entry.exposed_name).is_some() {
                tracing::warn!(server = %server, tool = %entry.exposed_name, "Duplicate tool name, keeping first");
                continue;
            }
            self.router.add(&entry, provider.clone(), spec.endpoint.timeout);
            self.catalog.insert(entry);
            added += 1;
        }

        tracing::info!(server = %server, tools = added, advertised, "Tool server connected");
        if added > 0 {
            self.context_flags.push(server.to_string());
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Servers that contributed at least one tool, in configuration order
    pub fn context_flags(&self) -> &[String] {
        &self.context_flags
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Close every opened session, most recent first
    pub async fn release(self) {
        for provider in self.providers.iter().rev() {
            if let Err(e) = provider.shutdown().await {
                tracing::debug!(server = %provider.server(), error = %e, "Error releasing tool session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::provider::ToolOutput;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeProvider {
        name: String,
        tools: Result<Vec<String>, String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ToolProvider for FakeProvider {
        fn server(&self) -> &str {
            &self.name
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
            match &self.tools {
                Ok(names) => Ok(names.iter().map(ToolDescriptor::new).collect()),
                Err(e) => Err(ToolError::Protocol(e.clone())),
            }
        }

        async fn call_tool(&self, _name: &str, _arguments: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("ok"))
        }

        async fn shutdown(&self) -> Result<(), ToolError> {
            self.log.lock().unwrap().push(self.name.clone());
            Err(ToolError::Connection("already closed".into()))
        }
    }

    /// Connector keyed by server name: tool list, listing error, or connect error
    struct FakeConnector {
        servers: HashMap<String, Result<Result<Vec<String>, String>, String>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ToolConnector for FakeConnector {
        async fn connect(&self, endpoint: &ServerEndpoint, _credential: &str) -> Result<Arc<dyn ToolProvider>, ToolError> {
            match self.servers.get(&endpoint.name) {
                Some(Ok(tools)) => Ok(Arc::new(FakeProvider {
                    name: endpoint.name.clone(),
                    tools: tools.clone(),
                    log: self.log.clone(),
                })),
                Some(Err(e)) => Err(ToolError::Handshake(e.clone())),
                None => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Err(ToolError::Connection("unreachable".into()))
                }
            }
        }
    }

    fn spec(name: &str, credential: Option<&str>) -> ServerSpec {
        ServerSpec::new(
            ServerEndpoint::new(name, format!("https://{}.example/mcp", name)).with_timeout(Duration::from_millis(50)),
            credential.map(String::from),
        )
    }

    fn connector(entries: Vec<(&str, Result<Result<Vec<&str>, &str>, &str>)>) -> FakeConnector {
        FakeConnector {
            servers: entries
                .into_iter()
                .map(|(name, r)| {
                    let r = r
                        .map(|tools| tools.map(|t| t.into_iter().map(String::from).collect()).map_err(String::from))
                        .map_err(String::from);
                    (name.to_string(), r)
                })
                .collect(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let c = connector(vec![("linear", Ok(Ok(vec!["get_issue"])))]);
        let manager = SessionManager::connect(&[spec("linear", None), spec("github", Some(""))], Some(&c)).await;
        assert_eq!(manager.status(), SessionStatus::NoCredentials);
        assert!(manager.catalog().is_empty());
    }

    #[tokio::test]
    async fn test_transport_unavailable() {
        let manager = SessionManager::connect(&[spec("linear", Some("key"))], None).await;
        assert_eq!(manager.status(), SessionStatus::TransportUnavailable);
        assert!(manager.router().is_empty());
    }

    #[tokio::test]
    async fn test_merge_in_config_order_with_first_wins() {
        let c = connector(vec![
            ("linear", Ok(Ok(vec!["get_issue", "search"]))),
            ("other", Ok(Ok(vec!["search", "list"]))),
        ]);
        let manager =
            SessionManager::connect(&[spec("linear", Some("a")), spec("other", Some("b"))], Some(&c)).await;

        let names: Vec<&str> = manager.catalog().entries().iter().map(|e| e.exposed_name.as_str()).collect();
        assert_eq!(names, vec!["get_issue", "search", "list"]);
        assert_eq!(manager.router().resolve("search").unwrap().server, "linear");
        assert_eq!(manager.router().resolve("search").unwrap().timeout, Duration::from_millis(50));
        assert_eq!(manager.context_flags(), ["linear".to_string(), "other".to_string()]);
        assert_eq!(manager.status(), SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_failed_servers_contribute_nothing() {
        let c = connector(vec![
            ("linear", Err("protocol version mismatch")),
            ("github", Ok(Ok(vec!["search_code", "create_issue"]))),
        ]);
        let github = spec("github", Some("t")).with_policy(
            CatalogPolicy::default()
                .with_prefix("github_")
                .with_allow(["search_code"]),
        );
        let manager =
            SessionManager::connect(&[spec("linear", Some("k")), github, spec("slow", Some("s"))], Some(&c)).await;

        assert_eq!(manager.catalog().len(), 1);
        assert!(manager.router().resolve("github_search_code").is_some());
        assert_eq!(manager.context_flags(), ["github".to_string()]);
    }

    #[tokio::test]
    async fn test_all_failed() {
        let c = connector(vec![("linear", Ok(Err("list failed")))]);
        let manager = SessionManager::connect(&[spec("linear", Some("k")), spec("slow", Some("s"))], Some(&c)).await;
        assert_eq!(manager.status(), SessionStatus::NoServersReachable);
        assert!(manager.catalog().is_empty());
        assert!(manager.context_flags().is_empty());
    }

    #[tokio::test]
    async fn test_release_reverse_order_swallows_errors() {
        let c = connector(vec![
            ("first", Ok(Ok(vec!["a"]))),
            ("second", Ok(Err("list failed"))),
            ("third", Ok(Ok(vec!["c"]))),
        ]);
        let log = c.log.clone();
        let manager = SessionManager::connect(
            &[spec("first", Some("1")), spec("second", Some("2")), spec("third", Some("3"))],
            Some(&c),
        )
        .await;

        manager.release().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["third".to_string(), "second".to_string(), "first".to_string()]
        );
    }

    #[test]
    fn test_spec_debug_redacts_credential() {
        let rendered = format!("{:?}", spec("linear", Some("lin_api_secret")));
        assert!(!rendered.contains("lin_api_secret"));
    }
}
