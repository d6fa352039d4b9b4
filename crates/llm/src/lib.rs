//! Generative model integration for RAG-o-Matic.
//!
//! A provider-agnostic [`LlmClient`] trait with two implementations:
//! - **Claude**: Anthropic Messages API (default)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use ragomatic_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is product-market fit?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{ClaudeClient, OllamaClient};
pub use ragomatic_core::ProviderType;
