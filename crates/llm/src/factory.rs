//! LLM provider factory.
//!
//! Maps a provider name from the model settings to a client implementation.

use crate::client::LlmClient;
use crate::providers::{ClaudeClient, OllamaClient, DEFAULT_OLLAMA_URL};
use ragomatic_core::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Errors
/// Returns a message if the provider is unknown or a required API key is
/// missing. Callers wrap it as a configuration error.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmClient>, String> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(
                OllamaClient::with_base_url(base_url).with_timeout(timeout),
            ))
        }
        Some(ProviderType::Claude) => {
            let api_key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| "Claude provider requires API key".to_string())?;
            let client = match endpoint {
                Some(url) => ClaudeClient::with_base_url(url, api_key),
                None => ClaudeClient::new(api_key),
            };
            Ok(Arc::new(client.with_timeout(timeout)))
        }
        None => Err(format!("Unknown provider: {}", provider)),
    }
}
