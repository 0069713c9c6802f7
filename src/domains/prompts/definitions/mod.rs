//! Prompt definitions module.
//!
//! Each prompt is defined in its own file with:
//! - Metadata (name, title, description, prompt type)
//! - Argument declarations
//! - Template string with `{argument}` placeholders
//!
//! ## Adding a New Prompt
//!
//! 1. Create a new file (e.g., `my_prompt.rs`)
//! 2. Implement the `PromptDefinition` trait
//! 3. Export it here
//! 4. Register in `registry.rs`

mod generate_code;
mod generate_design;
mod generate_requirements;

pub use generate_code::GenerateCodePrompt;
pub use generate_design::GenerateDesignPrompt;
pub use generate_requirements::GenerateRequirementsPrompt;

use super::templates::ArgumentSpec;

/// Trait for prompt definitions.
///
/// Each prompt must implement this trait to provide its metadata and template.
pub trait PromptDefinition {
    /// The unique identifier of the prompt.
    const NAME: &'static str;

    /// Display title.
    const TITLE: &'static str;

    /// A description of what the prompt does.
    const DESCRIPTION: &'static str;

    /// Workflow step reported in response metadata.
    const PROMPT_TYPE: &'static str;

    /// The template string with `{argument}` placeholders.
    fn template() -> &'static str;

    /// The arguments this prompt accepts, in declaration order.
    fn arguments() -> Vec<ArgumentSpec>;
}
