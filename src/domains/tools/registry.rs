//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - JSON dispatch for tool calls made over the SSE and HTTP transports
//! - Tool metadata for listing

use std::sync::Arc;
use tracing::warn;

use rmcp::model::Tool;

use crate::core::config::Config;

use super::ToolError;
use super::definitions::{CreateFileTool, ReadFileTool};

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    config: Arc<Config>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![CreateFileTool::NAME, ReadFileTool::NAME]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![CreateFileTool::to_tool(), ReadFileTool::to_tool()]
    }

    /// Dispatch a JSON tool call to the appropriate handler.
    pub fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        match name {
            CreateFileTool::NAME => CreateFileTool::http_handler(arguments, self.config.clone()),
            ReadFileTool::NAME => ReadFileTool::http_handler(arguments, self.config.clone()),
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::new(test_config());
        assert_eq!(registry.tool_names(), vec!["create_file", "read_file"]);
        assert_eq!(ToolRegistry::get_all_tools().len(), 2);
    }

    #[test]
    fn test_registry_call_read_missing_file() {
        let registry = ToolRegistry::new(test_config());
        let result = registry
            .call_tool("read_file", serde_json::json!({ "path": "/nonexistent/12345" }))
            .unwrap();
        assert_eq!(result["isError"], true);
    }

    #[test]
    fn test_registry_call_unknown() {
        let registry = ToolRegistry::new(test_config());
        let result = registry.call_tool("unknown", serde_json::json!({}));
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }
}
