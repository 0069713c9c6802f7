//! Spec-driven development MCP server.
//!
//! Serves three workflow prompts (requirements, design, code) that walk an
//! agent from a feature idea to an implementation, plus two file tools the
//! agent uses to save and reload the artifacts between steps.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, path security, the MCP server
//!   handler and the transports (STDIO, SSE, HTTP streaming)
//! - **domains**: business logic organized by bounded contexts
//!   - **prompts**: prompt catalog, templates and the rendering dispatcher
//!   - **tools**: `create_file` and `read_file`
//! - **cli**: command-line overrides
//!
//! # Example
//!
//! ```rust
//! use spec_driven_mcp_server::domains::prompts::{PromptRequest, PromptService};
//!
//! let service = PromptService::new();
//! let request = PromptRequest::new("generate-requirements")
//!     .with_argument("requirements", "a simple to-do app");
//! let rendered = service.render(&request).unwrap();
//! assert!(rendered.content.contains("a simple to-do app"));
//! ```

pub mod cli;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
