//! Prompt templates module.
//!
//! This module contains the `PromptTemplate` and `ArgumentSpec` types used to
//! describe and render prompt bodies.
//!
//! Templates use `{name}` placeholders. A template is parsed once into
//! literal and placeholder segments, and rendering walks those segments in a
//! single pass, so substituted values are never rescanned for placeholders.
//! A brace that does not enclose an identifier is kept as literal text.

use rmcp::model::PromptArgument;
use serde::Serialize;
use std::collections::HashMap;

use super::error::PromptError;

/// Declaration of one named prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentSpec {
    /// Argument name, also the placeholder name in the template.
    pub name: String,

    /// Human-readable description advertised to clients.
    pub description: String,

    /// Whether callers must supply a non-empty value.
    pub required: bool,

    /// Value used when an optional argument is absent or empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ArgumentSpec {
    /// A required argument (never has a default).
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// An optional argument that falls back to `default`.
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
            default: Some(default.into()),
        }
    }

    /// Convert to the rmcp wire model.
    pub fn to_prompt_argument(&self) -> PromptArgument {
        let description = match &self.default {
            Some(default) => format!("{} (default: {})", self.description, default),
            None => self.description.clone(),
        };

        PromptArgument {
            name: self.name.clone(),
            title: None,
            description: Some(description),
            required: Some(self.required),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed prompt template that can be rendered with argument values.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template string.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse_segments(&source);
        Self { source, segments }
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Render the template.
    ///
    /// Every placeholder must have a value in `values`. Placeholders without
    /// one are reported together as a validation error and nothing is
    /// rendered.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, PromptError> {
        let missing: Vec<&str> = self
            .placeholders()
            .into_iter()
            .filter(|name| !values.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(PromptError::validation(missing));
        }

        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(value) = values.get(name) {
                        rendered.push_str(value);
                    }
                }
            }
        }

        Ok(rendered)
    }
}

fn parse_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(after[..close].to_string()));
                rest = &after[close + 1..];
            }
            _ => {
                literal.push('{');
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_substitution() {
        let template = PromptTemplate::parse("Hello, {name}!");
        let result = template.render(&values(&[("name", "World")])).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = PromptTemplate::parse("{a} and {a} again");
        assert_eq!(template.placeholders(), vec!["a"]);
        let result = template.render(&values(&[("a", "x")])).unwrap();
        assert_eq!(result, "x and x again");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let template = PromptTemplate::parse("{first} / {second}");
        let result = template
            .render(&values(&[("first", "{second}"), ("second", "two")]))
            .unwrap();
        assert_eq!(result, "{second} / two");
    }

    #[test]
    fn test_missing_placeholder_is_validation_error() {
        let template = PromptTemplate::parse("{a} {b} {c}");
        let err = template.render(&values(&[("b", "x")])).unwrap_err();
        assert_eq!(err, PromptError::validation(["a", "c"]));
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let template = PromptTemplate::parse("fn main() { println!(\"{}\", {x}); }");
        assert_eq!(template.placeholders(), vec!["x"]);
        let result = template.render(&values(&[("x", "1")])).unwrap();
        assert_eq!(result, "fn main() { println!(\"{}\", 1); }");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let template = PromptTemplate::parse("tail {open");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&HashMap::new()).unwrap(), "tail {open");
    }

    #[test]
    fn test_optional_argument_description_mentions_default() {
        let arg = ArgumentSpec::optional("design_path", "Path of the design", "specs/design.md");
        let wire = arg.to_prompt_argument();
        assert_eq!(wire.required, Some(false));
        assert!(wire.description.unwrap().contains("specs/design.md"));
    }
}
