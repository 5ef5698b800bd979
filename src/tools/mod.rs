//! Tool System - external tool servers, catalog building, and routing

use std::sync::Arc;

mod catalog;
#[cfg(feature = "mcp")]
mod mcp;
mod provider;
mod router;
mod session;

pub use catalog::{CatalogEntry, CatalogPolicy, MISSING_DESCRIPTION, ToolCatalog, build_catalog};
#[cfg(feature = "mcp")]
pub use mcp::{McpHttpConnector, McpHttpProvider};
pub use provider::{ServerEndpoint, ServerTransport, ToolConnector, ToolDescriptor, ToolError, ToolOutput, ToolProvider};
pub use router::{Dispatch, Route, ToolRouter};
pub use session::{ServerSpec, SessionManager, SessionStatus};

/// Connector for the tool transport compiled into this build, if any
pub fn default_connector() -> Option<Arc<dyn ToolConnector>> {
    #[cfg(feature = "mcp")]
    {
        Some(Arc::new(McpHttpConnector::new()))
    }
    #[cfg(not(feature = "mcp"))]
    {
        None
    }
}
