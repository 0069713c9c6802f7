//! Prompt service implementation.
//!
//! The PromptService is the dispatcher: it resolves a prompt through the
//! registry, validates the caller's arguments and renders the template.
//! Rendering is pure; the service holds no mutable state, so any number of
//! calls may run concurrently.
//!
//! Prompts are defined in `definitions/` and registered via `registry.rs`.
//! Adding a new prompt does NOT require modifying this file.

use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::PromptError;
use super::model::{PromptRequest, PromptResponse};
use super::registry::{PromptRegistry, PromptSpec};

/// Service for listing and rendering prompts.
#[derive(Debug, Clone)]
pub struct PromptService {
    registry: Arc<PromptRegistry>,
}

impl PromptService {
    /// Create a service over the built-in prompt catalog.
    pub fn new() -> Self {
        info!("Initializing PromptService");
        Self::with_registry(Arc::new(PromptRegistry::builtin()))
    }

    /// Create a service over an explicit registry.
    pub fn with_registry(registry: Arc<PromptRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    /// Render a prompt invocation.
    ///
    /// Required arguments are checked before any text is produced; an absent
    /// or empty value counts as missing. Optional arguments that are absent
    /// or empty take their declared default.
    pub fn render(&self, request: &PromptRequest) -> Result<PromptResponse, PromptError> {
        let spec = self.registry.get(&request.prompt_id).inspect_err(|_| {
            warn!("Unknown prompt requested: {}", request.prompt_id);
        })?;

        let missing: Vec<&str> = spec
            .required_arguments()
            .filter(|arg| !has_value(&request.arguments, &arg.name))
            .map(|arg| arg.name.as_str())
            .collect();
        if !missing.is_empty() {
            warn!(prompt = %spec.id, ?missing, "Prompt request missing arguments");
            return Err(PromptError::validation(missing));
        }

        for name in request.arguments.keys() {
            if spec.argument(name).is_none() {
                debug!(prompt = %spec.id, argument = %name, "Ignoring undeclared argument");
            }
        }

        let values = resolve_arguments(spec, &request.arguments);
        let content = spec.template.render(&values)?;

        let mut metadata: BTreeMap<String, String> = values.into_iter().collect();
        metadata.insert("prompt_type".to_string(), spec.prompt_type.clone());

        Ok(PromptResponse {
            prompt_id: spec.id.clone(),
            description: spec.description.clone(),
            content,
            metadata,
        })
    }

    /// List all available prompts as rmcp models.
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.registry.list().iter().map(PromptSpec::to_prompt).collect()
    }

    /// Get a prompt with arguments substituted, as an rmcp result.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult, PromptError> {
        let request = PromptRequest {
            prompt_id: name.to_string(),
            arguments: arguments.unwrap_or_default(),
        };
        let response = self.render(&request)?;

        Ok(GetPromptResult {
            description: Some(response.description),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                response.content,
            )],
        })
    }
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}

fn has_value(arguments: &HashMap<String, String>, name: &str) -> bool {
    arguments.get(name).is_some_and(|v| !v.is_empty())
}

/// Declared arguments only: supplied non-empty values, else defaults.
fn resolve_arguments(
    spec: &PromptSpec,
    supplied: &HashMap<String, String>,
) -> HashMap<String, String> {
    spec.arguments
        .iter()
        .filter_map(|arg| {
            let value = supplied
                .get(&arg.name)
                .filter(|v| !v.is_empty())
                .or(arg.default.as_ref())?;
            Some((arg.name.clone(), value.clone()))
        })
        .collect()
}
