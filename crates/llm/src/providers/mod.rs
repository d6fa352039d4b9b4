//! Generative model providers.

pub mod claude;
pub mod ollama;

pub use claude::{ClaudeClient, DEFAULT_CLAUDE_URL};
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
