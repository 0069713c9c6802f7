//! Prompts domain module.
//!
//! This module handles all prompt-related functionality for the MCP server.
//! Prompts are template messages for the spec-driven workflow
//! (requirements → design → code) that are customized with arguments.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual prompt definitions (one file per prompt)
//! - `registry.rs` - Immutable prompt catalog
//! - `service.rs` - Dispatcher for listing and rendering
//! - `templates.rs` - Template parsing and rendering
//! - `model.rs` - Request and response values
//!
//! ## Adding a New Prompt
//!
//! 1. Create a new file in `definitions/` (e.g., `my_prompt.rs`)
//! 2. Implement the `PromptDefinition` trait
//! 3. Export in `definitions/mod.rs`
//! 4. Register in `registry.rs`
//!
//! **No need to modify `service.rs`!**

pub mod definitions;
mod error;
mod model;
mod registry;
mod service;
pub mod templates;

pub use definitions::PromptDefinition;
pub use error::PromptError;
pub use model::{PromptRequest, PromptResponse, string_arguments};
pub use registry::{PromptRegistry, PromptSpec, prompt_names};
pub use service::PromptService;
pub use templates::{ArgumentSpec, PromptTemplate};
