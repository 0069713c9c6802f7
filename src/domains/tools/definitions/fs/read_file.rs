//! Read file tool definition.

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
use crate::core::security::validate_path;
use crate::domains::tools::ToolError;

/// Parameters for the read file tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path of the file to read. Relative paths are resolved against the
    /// workspace root.
    pub path: String,
}

/// Read file tool - returns the text content of a file.
pub struct ReadFileTool;

impl ReadFileTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "read_file";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Read a UTF-8 text file, such as a previously generated requirements or design document.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &ReadFileParams, config: &Config) -> CallToolResult {
        info!("Read file tool called for path: {}", params.path);

        if params.path.is_empty() {
            return CallToolResult::error(vec![Content::text("'path' is required")]);
        }

        let path = match validate_path(&params.path, config) {
            Ok(p) => p,
            Err(e) => {
                warn!("Path security validation failed: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Path security validation failed: {}",
                    e
                ))]);
            }
        };

        if !path.is_file() {
            return CallToolResult::error(vec![Content::text(format!(
                "Path is not a file: {}",
                params.path
            ))]);
        }

        match fs::read_to_string(&path) {
            Ok(content) => CallToolResult::success(vec![Content::text(content)]),
            Err(e) => {
                warn!("Failed to read file: {}", e);
                CallToolResult::error(vec![Content::text(format!(
                    "Failed to read file {}: {}",
                    params.path, e
                ))])
            }
        }
    }

    /// HTTP handler for this tool (for the SSE and HTTP transports).
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, ToolError> {
        let path = arguments
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_arguments("Missing or invalid 'path' parameter"))?
            .to_string();

        let result = Self::execute(&ReadFileParams { path }, &config);

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
            input_schema: cached_schema_for_type::<ReadFileParams>(),
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
                let params: ReadFileParams =
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_read_file_execute() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("design.md");
        fs::write(&file, "# Design").unwrap();

        let params = ReadFileParams {
            path: file.to_string_lossy().to_string(),
        };
        let result = ReadFileTool::execute(&params, &Config::default());
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(text_of(&result), "# Design");
    }

    #[test]
    fn test_read_file_nonexistent() {
        let params = ReadFileParams {
            path: "/nonexistent/path/12345.md".to_string(),
        };
        let result = ReadFileTool::execute(&params, &Config::default());
        assert!(result.is_error.unwrap_or(false));
    }

    #[test]
    fn test_read_file_directory_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let params = ReadFileParams {
            path: temp_dir.path().to_string_lossy().to_string(),
        };
        let result = ReadFileTool::execute(&params, &Config::default());
        assert!(result.is_error.unwrap_or(false));
        assert!(text_of(&result).contains("not a file"));
    }

    #[test]
    fn test_read_file_http_handler() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.md");
        fs::write(&file, "hello").unwrap();

        let args = serde_json::json!({ "path": file.to_string_lossy() });
        let value = ReadFileTool::http_handler(args, Arc::new(Config::default())).unwrap();
        assert_eq!(value["isError"], false);
    }
}
