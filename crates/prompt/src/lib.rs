//! Prompt contracts for RAG-o-Matic.
//!
//! - YAML prompt definitions, built in and overridable per workspace
//! - Handlebars rendering of system and user messages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, list_prompts, load_prompt, PERSONA_REWRITE, PLAIN_ANSWER, STRUCTURED_ANSWER,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
