//! Error types for RAG-o-Matic.
//!
//! One enum covers every failure category the workspace can report. Web
//! search never produces one of these on its own: transport problems on that
//! path are folded into diagnostics instead (see `ragomatic-websearch`).

use thiserror::Error;

/// Unified error type for RAG-o-Matic.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid settings, credentials, or providers
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generative model errors (transport, auth, malformed reply)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Corpus loading, indexing and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt definition and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Web search errors that escaped degradation (probe setup, client build)
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from the generative model.
    ///
    /// The CLI uses this to decide which remediation hint to print.
    pub fn is_llm(&self) -> bool {
        matches!(self, AppError::Llm(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
