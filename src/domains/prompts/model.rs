//! Request and response values for prompt invocations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One prompt invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Identifier of the prompt to render.
    #[serde(alias = "name")]
    pub prompt_id: String,

    /// Argument values supplied by the caller.
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

impl PromptRequest {
    /// Create a request with no arguments.
    pub fn new(prompt_id: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            arguments: HashMap::new(),
        }
    }

    /// Add an argument value.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptResponse {
    /// Identifier of the rendered prompt.
    pub prompt_id: String,

    /// Prompt description, echoed for transports.
    pub description: String,

    /// Rendered markdown text.
    pub content: String,

    /// `prompt_type` plus the resolved argument values.
    pub metadata: BTreeMap<String, String>,
}

/// Keep the string-valued entries of a JSON object as prompt arguments.
///
/// Non-string values are dropped, so a required argument sent as a number
/// is reported as missing rather than silently coerced.
pub fn string_arguments(
    map: serde_json::Map<String, serde_json::Value>,
) -> HashMap<String, String> {
    map.into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_name_alias() {
        let request: PromptRequest = serde_json::from_value(serde_json::json!({
            "name": "generate-requirements",
            "arguments": { "requirements": "a todo app" }
        }))
        .unwrap();

        assert_eq!(
            request,
            PromptRequest::new("generate-requirements").with_argument("requirements", "a todo app")
        );
    }

    #[test]
    fn test_string_arguments_drops_non_strings() {
        let map = serde_json::json!({ "a": "x", "b": 3, "c": null })
            .as_object()
            .cloned()
            .unwrap();
        let args = string_arguments(map);
        assert_eq!(args.len(), 1);
        assert_eq!(args["a"], "x");
    }
}
