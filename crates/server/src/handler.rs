//! MCP server handler implementation.
//!
//! Each tool delivers one lifecycle event to the running worker and returns
//! the outcome as JSON text.
use std::sync::Arc;

use crate::tools::{
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl},
    message::{SwMessageParams, message_impl},
    status::status_impl,
};
use precache_client::FetchClient;
use precache_core::WorkerHandle;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler fronting one worker.
#[derive(Clone)]
pub struct PrecacheServer {
    worker: WorkerHandle,
    network: Arc<FetchClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PrecacheServer {
    /// Create a new server handler.
    pub fn new(worker: WorkerHandle, network: Arc<FetchClient>) -> Self {
        Self { worker, network, tool_router: Self::tool_router() }
    }

    #[tool(description = "Deliver the install event: fetch the shell resources fresh into the temp store.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(
        description = "Deliver the activate event: reconcile the content store with the manifest and persist it."
    )]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Route a request through the worker.
    ///
    /// Manifest resources are answered from the content store or fetched and cached;
    /// other requests go straight to the network.
    #[tool(description = "Fetch a URL through the worker. Reports whether it was served from cache, network, or passed through.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Post a message to the worker: \"skipWaiting\" or \"downloadOffline\".")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report worker state, content store coverage of the manifest, and persisted manifest status.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }
}

impl ServerHandler for PrecacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "precache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
