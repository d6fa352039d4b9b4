//! RAG-o-Matic core library.
//!
//! Shared foundations for every crate in the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging setup
//! - Layered configuration (`AppConfig`, `Settings`)

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod settings;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use provider::ProviderType;
pub use settings::{
    AnswerFormat, ModelSettings, PersonaSettings, PlatformRule, RetrievalSettings, SearchMode,
    Settings, SettingsOverride, WebSearchSettings,
};
