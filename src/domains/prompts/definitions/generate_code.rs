//! Code generation prompt definition.

use super::PromptDefinition;
use crate::domains::prompts::templates::ArgumentSpec;

/// Final workflow step: implement the design.
pub struct GenerateCodePrompt;

impl PromptDefinition for GenerateCodePrompt {
    const NAME: &'static str = "generate-code-from-design";
    const TITLE: &'static str = "Generate code from design";
    const DESCRIPTION: &'static str = "Generate code from design.md";
    const PROMPT_TYPE: &'static str = "code_generation";

    fn template() -> &'static str {
        r#"Read the design document at {design_path} and generate a complete implementation of it.

Produce the following:

## 1. Project Structure
- An appropriate directory layout
- Required configuration files
- Dependency management files

## 2. Core Implementation
- All core modules
- The architecture described in the design document
- Appropriate error handling

## 3. Data Layer
- Data models
- Data access layer
- Data validation

## 4. Business Logic
- Core business logic
- Service layer
- Business rule validation

## 5. Interface Layer
- API endpoints
- User interface (if applicable)
- Input validation and response handling

## 6. Configuration and Deployment
- Configuration files
- Deployment scripts
- Environment variables

## 7. Tests
- Unit tests
- Integration tests
- Test data and mocks

## 8. Documentation
- README.md
- API documentation
- Usage instructions

The generated code must follow established conventions for the chosen stack, be readable and maintainable, include appropriate comments and stay consistent with {design_path}. Write the generated files under {output_directory}.
"#
    }

    fn arguments() -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::optional(
                "design_path",
                "Path of the design document",
                "specs/design.md",
            ),
            ArgumentSpec::optional(
                "output_directory",
                "Directory the agent should write the generated code to",
                ".",
            ),
        ]
    }
}
