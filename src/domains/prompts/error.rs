//! Prompt-specific error types.

use thiserror::Error;

/// Errors that can occur during prompt operations.
///
/// Both variants are terminal for a single invocation: nothing is rendered
/// and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    /// The requested prompt was not found.
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// One or more required arguments are missing or empty.
    #[error("Missing required argument(s): {}", .0.join(", "))]
    Validation(Vec<String>),
}

impl PromptError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new validation error listing the missing fields.
    pub fn validation<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation(missing.into_iter().map(Into::into).collect())
    }

    /// Stable machine-readable kind, used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
        }
    }

    /// Names of the missing fields (empty for `NotFound`).
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::NotFound(_) => &[],
            Self::Validation(missing) => missing,
        }
    }

    /// Structured `{kind, message, missing?}` payload for transports.
    pub fn details(&self) -> serde_json::Value {
        let mut details = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Validation(missing) = self {
            details["missing"] = serde_json::json!(missing);
        }
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = PromptError::validation(["requirements", "output_path"]);
        assert_eq!(
            err.to_string(),
            "Missing required argument(s): requirements, output_path"
        );
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.missing_fields(), ["requirements", "output_path"]);
    }

    #[test]
    fn test_details_payload() {
        let details = PromptError::not_found("unknown-prompt").details();
        assert_eq!(details["kind"], "not_found");
        assert!(details.get("missing").is_none());

        let details = PromptError::validation(["requirements"]).details();
        assert_eq!(details["kind"], "validation");
        assert_eq!(details["missing"], serde_json::json!(["requirements"]));
    }
}
