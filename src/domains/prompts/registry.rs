//! Prompt Registry - central registration of all prompts.
//!
//! The registry is built once at startup and is read-only afterwards, so it
//! can be shared across any number of concurrent requests behind an `Arc`.
//! When adding a new prompt:
//! 1. Create the prompt file in `definitions/`
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it here in `PromptRegistry::builtin()`

use rmcp::model::Prompt;
use std::collections::HashMap;
use tracing::{info, warn};

use super::definitions::{
    GenerateCodePrompt, GenerateDesignPrompt, GenerateRequirementsPrompt, PromptDefinition,
};
use super::error::PromptError;
use super::templates::{ArgumentSpec, PromptTemplate};

/// One available prompt: metadata, argument contract and parsed template.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// Stable identifier used for lookup.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Display description.
    pub description: String,

    /// Workflow step, reported in response metadata.
    pub prompt_type: String,

    /// Ordered argument contract.
    pub arguments: Vec<ArgumentSpec>,

    /// Parsed template body.
    pub template: PromptTemplate,
}

impl PromptSpec {
    /// Build a spec from a `PromptDefinition`.
    pub fn from_definition<P: PromptDefinition>() -> Self {
        Self {
            id: P::NAME.to_string(),
            title: P::TITLE.to_string(),
            description: P::DESCRIPTION.to_string(),
            prompt_type: P::PROMPT_TYPE.to_string(),
            arguments: P::arguments(),
            template: PromptTemplate::parse(P::template()),
        }
    }

    /// Arguments callers must supply.
    pub fn required_arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter().filter(|arg| arg.required)
    }

    /// Look up an argument declaration by name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Convert to the rmcp `Prompt` advertised by `prompts/list`.
    pub fn to_prompt(&self) -> Prompt {
        Prompt {
            name: self.id.clone(),
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            arguments: Some(
                self.arguments
                    .iter()
                    .map(ArgumentSpec::to_prompt_argument)
                    .collect(),
            ),
            icons: None,
            meta: None,
        }
    }
}

/// Immutable catalog of prompts in declaration order.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    prompts: Vec<PromptSpec>,
    index: HashMap<String, usize>,
}

impl PromptRegistry {
    /// The built-in requirements → design → code catalog.
    pub fn builtin() -> Self {
        Self::from_specs(vec![
            PromptSpec::from_definition::<GenerateRequirementsPrompt>(),
            PromptSpec::from_definition::<GenerateDesignPrompt>(),
            PromptSpec::from_definition::<GenerateCodePrompt>(),
        ])
    }

    /// Build a registry from explicit specs. The first spec registered under
    /// an id wins; later duplicates are dropped.
    pub fn from_specs(specs: Vec<PromptSpec>) -> Self {
        let mut prompts = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs {
            if index.contains_key(&spec.id) {
                warn!("Duplicate prompt id ignored: {}", spec.id);
                continue;
            }
            info!("Registering prompt: {}", spec.id);
            index.insert(spec.id.clone(), prompts.len());
            prompts.push(spec);
        }

        Self { prompts, index }
    }

    /// All prompts in declaration order.
    pub fn list(&self) -> &[PromptSpec] {
        &self.prompts
    }

    /// Look up a prompt by id.
    pub fn get(&self, id: &str) -> Result<&PromptSpec, PromptError> {
        self.index
            .get(id)
            .map(|&i| &self.prompts[i])
            .ok_or_else(|| PromptError::not_found(id))
    }

    /// Number of registered prompts.
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Get the list of all built-in prompt names.
pub fn prompt_names() -> Vec<&'static str> {
    vec![
        GenerateRequirementsPrompt::NAME,
        GenerateDesignPrompt::NAME,
        GenerateCodePrompt::NAME,
    ]
}
