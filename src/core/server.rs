//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the prompt service and the file tools.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool defines:
//! - Parameters struct (for rmcp)
//! - `execute()` method (core logic)
//! - `http_handler()` method (called via ToolRegistry for SSE/HTTP)
//!
//! The ToolRouter is built dynamically in `domains/tools/router.rs`.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::prompts::{PromptError, PromptService, string_arguments};
use crate::domains::tools::build_tool_router;

#[cfg(any(feature = "sse", feature = "http"))]
use crate::domains::{
    prompts::{PromptRequest, PromptResponse},
    tools::{ToolError, ToolRegistry},
};

/// The main MCP server handler.
///
/// Cloning is cheap: the configuration and the prompt catalog are shared.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Service for listing and rendering prompts.
    prompt_service: Arc<PromptService>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> Self {
        Self::with_prompt_service(config, PromptService::new())
    }

    /// Create a server over an explicit prompt service.
    pub fn with_prompt_service(config: Config, prompt_service: PromptService) -> Self {
        let config = Arc::new(config);

        Self {
            tool_router: build_tool_router::<Self>(config.clone()),
            config,
            prompt_service: Arc::new(prompt_service),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Instructions sent to clients on initialize.
    pub fn instructions(&self) -> &str {
        &self.config.server.instructions
    }

    /// Get the server configuration (for tool access).
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The prompt service backing this server.
    pub fn prompt_service(&self) -> &PromptService {
        &self.prompt_service
    }

    // ========================================================================
    // SSE / HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools as JSON.
    #[cfg(any(feature = "sse", feature = "http"))]
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        ToolRegistry::get_all_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name with JSON arguments.
    ///
    /// Tools touch the filesystem, so the call runs on the blocking pool.
    #[cfg(any(feature = "sse", feature = "http"))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let registry = ToolRegistry::new(self.config.clone());
        let name = name.to_string();
        tokio::task::spawn_blocking(move || registry.call_tool(&name, arguments))
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?
    }

    /// List all available prompts as JSON.
    #[cfg(any(feature = "sse", feature = "http"))]
    pub fn list_prompts(&self) -> Vec<serde_json::Value> {
        self.prompt_service
            .list_prompts()
            .into_iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "title": p.title,
                    "description": p.description,
                    "arguments": p.arguments
                })
            })
            .collect()
    }

    /// Get a prompt by name as a JSON `prompts/get` result.
    #[cfg(any(feature = "sse", feature = "http"))]
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, PromptError> {
        let args = arguments.and_then(|v| match v {
            serde_json::Value::Object(map) => Some(string_arguments(map)),
            _ => None,
        });

        let result = self.prompt_service.get_prompt(name, args)?;
        Ok(serde_json::json!({
            "description": result.description,
            "messages": result.messages
        }))
    }

    /// Render a prompt request directly.
    #[cfg(any(feature = "sse", feature = "http"))]
    pub fn render_prompt(&self, request: &PromptRequest) -> Result<PromptResponse, PromptError> {
        self.prompt_service.render(request)
    }
}

/// Map a prompt failure to an MCP `invalid_params` error carrying details.
fn prompt_error_to_mcp(err: PromptError) -> McpError {
    McpError::invalid_params(err.to_string(), Some(err.details()))
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.config.server.instructions.clone()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        Ok(ListPromptsResult {
            prompts: self.prompt_service.list_prompts(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        let arguments = request.arguments.map(string_arguments);
        self.prompt_service
            .get_prompt(&request.name, arguments)
            .map_err(prompt_error_to_mcp)
    }
}
