//! Create file tool definition.
//!
//! Writes a generated artifact (requirements, design, source file) to disk,
//! creating parent directories as needed.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::config::Config;
use crate::core::security::validate_write_path;
use crate::domains::tools::ToolError;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the create file tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateFileParams {
    /// Path of the file to create. Relative paths are resolved against the
    /// workspace root.
    pub path: String,

    /// UTF-8 text content to write.
    pub content: String,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Create file tool - writes text content to a file.
pub struct CreateFileTool;

impl CreateFileTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "create_file";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Create or overwrite a text file, creating parent directories as needed. Use it to save generated requirements, design documents and code.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &CreateFileParams, config: &Config) -> CallToolResult {
        info!("Create file tool called for path: {}", params.path);

        if params.path.is_empty() || params.content.is_empty() {
            warn!("Create file called without path or content");
            return CallToolResult::error(vec![Content::text(
                "Both 'path' and 'content' are required",
            )]);
        }

        let path = match validate_write_path(&params.path, config) {
            Ok(p) => p,
            Err(e) => {
                warn!("Path security validation failed: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Path security validation failed: {}",
                    e
                ))]);
            }
        };

        if path.is_dir() {
            return CallToolResult::error(vec![Content::text(format!(
                "Path is a directory: {}",
                params.path
            ))]);
        }

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create parent directories: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))]);
            }
        }

        if let Err(e) = fs::write(&path, &params.content) {
            warn!("Failed to write file: {}", e);
            return CallToolResult::error(vec![Content::text(format!(
                "Failed to create file {}: {}",
                params.path, e
            ))]);
        }

        info!("Wrote {} bytes to {}", params.content.len(), path.display());

        CallToolResult::success(vec![Content::text(format!(
            "File created: {} ({} bytes)",
            params.path,
            params.content.len()
        ))])
    }

    /// HTTP handler for this tool (for the SSE and HTTP transports).
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, ToolError> {
        let params: CreateFileParams = serde_json::from_value(arguments)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;

        let result = Self::execute(&params, &config);

        Ok(serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<CreateFileParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for the STDIO transport.
    pub fn create_route<S>(config: Arc<Config>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let config = config.clone();
            async move {
                let params: CreateFileParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                tokio::task::spawn_blocking(move || Self::execute(&params, &config))
                    .await
                    .map_err(|e| McpError::internal_error(e.to_string(), None))
            }
            .boxed()
        })
    }
}
