//! Requirements generation prompt definition.

use super::PromptDefinition;
use crate::domains::prompts::templates::ArgumentSpec;

/// First workflow step: turn high-level requirements into an EARS
/// requirements document.
pub struct GenerateRequirementsPrompt;

impl PromptDefinition for GenerateRequirementsPrompt {
    const NAME: &'static str = "generate-requirements";
    const TITLE: &'static str = "Generate requirements document";
    const DESCRIPTION: &'static str = "Generate requirements.md using EARS format";
    const PROMPT_TYPE: &'static str = "requirements_generation";

    fn template() -> &'static str {
        r#"Based on the high-level requirements below, generate a detailed requirements document using the EARS (Easy Approach to Requirements Syntax) format.

High-level requirements:
{requirements}

Produce a complete requirements.md document with the following sections:

# Requirements Document

## 1. Project Overview
- Project name
- Project description
- Target users
- Primary goals

## 2. Functional Requirements (EARS format)

Use these EARS templates:
- **WHEN** <optional precondition or trigger> **THE SYSTEM SHALL** <system response>
- **WHERE** <optional feature scope> **THE SYSTEM SHALL** <system response>
- **WHILE** <optional state condition> **THE SYSTEM SHALL** <system response>

Examples:
- WHEN the user clicks the "Add task" button THE SYSTEM SHALL display the task creation form
- WHERE the user is on the task list page THE SYSTEM SHALL display all open tasks
- WHILE the user is editing a task THE SYSTEM SHALL save changes automatically

## 3. Non-Functional Requirements
- Performance
- Usability
- Compatibility
- Security

## 4. Constraints
- Technical constraints
- Business constraints
- Schedule constraints

## 5. Acceptance Criteria
- Functional acceptance criteria
- Performance acceptance criteria
- User experience acceptance criteria

Make sure every requirement is detailed, unambiguous and testable. Save the generated document to {output_path}.
"#
    }

    fn arguments() -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required(
                "requirements",
                "High-level requirements of the application. Example: 'A Vue.js todo \
                 application with task creation, completion tracking, and local storage \
                 persistence'",
            ),
            ArgumentSpec::optional(
                "output_path",
                "Where the agent should save the requirements document",
                "specs/requirements.md",
            ),
        ]
    }
}
