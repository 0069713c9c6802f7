//! Domains module containing business logic organized by bounded contexts.
//!
//! - **prompts**: the spec-driven workflow prompt catalog and dispatcher
//! - **tools**: file tools the consuming agent uses to save and load artifacts

pub mod prompts;
pub mod tools;
