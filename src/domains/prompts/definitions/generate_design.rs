//! Design generation prompt definition.

use super::PromptDefinition;
use crate::domains::prompts::templates::ArgumentSpec;

/// Second workflow step: derive a design document from the requirements.
///
/// The requirements document is referenced by path; the consuming agent
/// reads it, this server never does.
pub struct GenerateDesignPrompt;

impl PromptDefinition for GenerateDesignPrompt {
    const NAME: &'static str = "generate-design-from-requirements";
    const TITLE: &'static str = "Generate design from requirements";
    const DESCRIPTION: &'static str = "Generate design.md from requirements.md";
    const PROMPT_TYPE: &'static str = "design_generation";

    fn template() -> &'static str {
        r#"Read the requirements document at {requirements_path} and generate a detailed design document from it.

Produce a complete design.md document with the following sections:

# Design Document

## 1. System Architecture
- Overall architecture diagram
- Technology stack
- Architecture decisions and their rationale

## 2. Module Design
- Core modules
- Responsibilities of each module
- Interactions between modules

## 3. Data Design
- Data models
- Database design (if applicable)
- Data flow

## 4. Interface Design
- API design
- User interface design
- External interfaces

## 5. Detailed Design
- Key algorithms
- Implementation approach for core features
- Error handling

## 6. Security Design
- Authentication and authorization
- Data protection
- Security risk assessment

## 7. Performance Design
- Optimization strategy
- Caching strategy
- Scalability

## 8. Deployment Design
- Deployment architecture
- Environment configuration
- Monitoring and logging

Keep the design consistent with every requirement in {requirements_path} and include enough technical detail to drive the implementation. Save the generated document to {output_path}.
"#
    }

    fn arguments() -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::optional(
                "requirements_path",
                "Path of the requirements document",
                "specs/requirements.md",
            ),
            ArgumentSpec::optional(
                "output_path",
                "Where the agent should save the design document",
                "specs/design.md",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_design_metadata() {
        assert_eq!(GenerateDesignPrompt::NAME, "generate-design-from-requirements");

        let args = GenerateDesignPrompt::arguments();
        assert!(args.iter().all(|a| !a.required));
        assert_eq!(args[0].default.as_deref(), Some("specs/requirements.md"));
        assert_eq!(args[1].default.as_deref(), Some("specs/design.md"));
    }
}
