//! MCP server implementation.
//!
//! This module contains the main server setup using rmcp.

use crate::error::Error;
use crate::models::{EnvironmentsParams, FindRoutineParams, SearchTableParams};
use crate::tools::Tools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{
    ErrorData as McpError, ServiceExt, handler::server::ServerHandler, tool, tool_handler,
    tool_router,
};
use sonda::Sonda;
use std::sync::Arc;

/// The sonda MCP server.
///
/// Provides MCP protocol handling over stdio transport.
#[derive(Clone)]
pub struct SondaMcpServer {
    /// Tool implementations.
    tools: Arc<Tools>,
    /// Tool router for MCP dispatch.
    tool_router: ToolRouter<Self>,
}

/// Map a server error onto the MCP error space.
fn to_mcp_error(e: &Error) -> McpError {
    if e.is_input_error() {
        McpError::invalid_params(e.to_string(), None)
    } else {
        McpError::internal_error(e.to_string(), None)
    }
}

#[tool_router]
impl SondaMcpServer {
    /// Locate a routine and describe it.
    #[tool(
        description = "Locate a Protheus/ADVPL routine by name (e.g. U_PCMCTF43, MATA010) and classify it as standard or custom. The action selects extra output: locate, structure, report, source or git_status."
    )]
    async fn find_routine(
        &self,
        Parameters(params): Parameters<FindRoutineParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.tools.find_routine(params).await {
            Ok(envelope) => Ok(CallToolResult::success(vec![Content::json(envelope)?])),
            Err(e) => Err(to_mcp_error(&e)),
        }
    }

    /// List routines that use a table.
    #[tool(
        description = "List routines that reference a table (e.g. SA1, PD3), ranked by usage category: browse, crud, query, report, integration, other. Standard routines are excluded unless include_standard is true."
    )]
    async fn search_table(
        &self,
        Parameters(params): Parameters<SearchTableParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.tools.search_table(params).await {
            Ok(envelope) => Ok(CallToolResult::success(vec![Content::json(envelope)?])),
            Err(e) => Err(to_mcp_error(&e)),
        }
    }

    /// Show configured environments.
    #[tool(
        description = "Show the configured staging, production and standard roots, the classification cache size and the prefixes learned from the standard tree."
    )]
    async fn environments(
        &self,
        Parameters(params): Parameters<EnvironmentsParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.tools.environments(params.discover).await {
            Ok(response) => Ok(CallToolResult::success(vec![Content::json(response)?])),
            Err(e) => Err(to_mcp_error(&e)),
        }
    }
}

impl SondaMcpServer {
    /// Create a new sonda MCP server.
    #[must_use]
    pub fn new(sonda: Sonda) -> Self {
        Self {
            tools: Arc::new(Tools::new(sonda)),
            tool_router: Self::tool_router(),
        }
    }

    /// Serve over stdio until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mcp`] if the handshake fails or the service stops abnormally.
    pub async fn run(self) -> crate::Result<()> {
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        let reason = service.waiting().await.map_err(|e| Error::Mcp(e.to_string()))?;
        tracing::info!(?reason, "sonda-mcp server stopped");
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for SondaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sonda-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Sonda locates Protheus/ADVPL routines and table usage in configured source trees. Use find_routine for one routine, search_table for a table, environments to check configuration."
                    .into(),
            ),
        }
    }
}
