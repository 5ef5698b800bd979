//! Tool routing
//!
//! Maps each exposed tool name to the provider that owns it and the name
//! that provider knows the tool by.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;

use super::catalog::CatalogEntry;
use super::provider::{ToolError, ToolOutput, ToolProvider};

/// Where an exposed tool name is dispatched to
#[derive(Clone)]
pub struct Route {
    pub provider: Arc<dyn ToolProvider>,
    pub original_name: String,
    pub server: String,
    /// Deadline for a single call on this route
    pub timeout: Duration,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("original_name", &self.original_name)
            .field("server", &self.server)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Outcome of routing a single tool invocation
#[derive(Debug)]
pub enum Dispatch {
    /// No route for the exposed name; nothing was called
    Unknown,
    /// The owning provider answered
    Completed { original_name: String, output: ToolOutput },
    /// The owning provider failed to answer
    Failed { original_name: String, error: ToolError },
}

/// Exposed name to provider lookup, valid for one conversation
#[derive(Debug, Clone, Default)]
pub struct ToolRouter {
    routes: HashMap<String, Route>,
}

impl ToolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the route for a catalog entry
    pub fn add(&mut self, entry: &CatalogEntry, provider: Arc<dyn ToolProvider>, call_timeout: Duration) {
        self.routes.insert(
            entry.exposed_name.clone(),
            Route {
                provider,
                original_name: entry.original_name.clone(),
                server: entry.server.clone(),
                timeout: call_timeout,
            },
        );
    }

    pub fn resolve(&self, exposed: &str) -> Option<&Route> {
        self.routes.get(exposed)
    }

    /// Call the tool behind an exposed name
    ///
    /// A call that outlives the route's deadline is reported as failed.
    pub async fn dispatch(&self, exposed: &str, arguments: Value) -> Dispatch {
        let Some(route) = self.resolve(exposed) else {
            return Dispatch::Unknown;
        };

        let result = match timeout(route.timeout, route.provider.call_tool(&route.original_name, arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(route.timeout)),
        };

        match result {
            Ok(output) => Dispatch::Completed {
                original_name: route.original_name.clone(),
                output,
            },
            Err(error) => Dispatch::Failed {
                original_name: route.original_name.clone(),
                error,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
