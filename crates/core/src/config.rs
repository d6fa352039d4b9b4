//! Configuration loading for the RAG-o-Matic CLI.
//!
//! Sources, lowest precedence first:
//! - built-in defaults ([`Settings::default`])
//! - the YAML override file (`.ragomatic/config.yaml` or `RAGOMATIC_CONFIG`)
//! - environment variables
//! - command-line flags ([`AppConfig::with_overrides`])
//!
//! Each layer goes through [`Settings::resolve`], so a layer only ever
//! replaces the leaves it sets.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::provider::ProviderType;
use crate::settings::{
    ModelOverride, SearchMode, Settings, SettingsOverride, WebSearchOverride,
};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Workspace root (contains `.ragomatic/`, the corpus and the index)
    pub workspace: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Resolved settings
    pub settings: Settings,
}

/// On-disk config file: settings plus a logging section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(flatten)]
    settings: SettingsOverride,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            settings: Settings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration for a workspace.
    ///
    /// `workspace` and `config_file` come from the CLI (which already folds
    /// in `RAGOMATIC_WORKSPACE` / `RAGOMATIC_CONFIG`). Environment variables
    /// read here:
    /// - `RAGOMATIC_PROVIDER`: generative provider
    /// - `RAGOMATIC_MODEL`: model id or catalog alias
    /// - `RAGOMATIC_WEB`: web search mode (off, on, always)
    /// - `NO_COLOR`: disable colored output
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config_file
            .clone()
            .unwrap_or_else(|| config.ragomatic_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
            config.config_file = Some(config_path);
        } else if config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.settings = Settings::resolve(config.settings, env_override()?);

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML override file into this config.
    fn merge_yaml(mut self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self.settings = Settings::resolve(self.settings, file.settings);
        tracing::debug!("Merged config file {:?}", path);

        Ok(self)
    }

    /// Apply CLI overrides; flags beat everything else.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        let overrides = SettingsOverride {
            models: Some(ModelOverride {
                provider,
                model,
                ..Default::default()
            }),
            ..Default::default()
        };
        self.settings = Settings::resolve(self.settings, overrides);

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// The `.ragomatic` directory inside the workspace.
    pub fn ragomatic_dir(&self) -> PathBuf {
        self.workspace.join(".ragomatic")
    }

    /// Corpus directory resolved against the workspace.
    pub fn corpus_dir(&self) -> PathBuf {
        self.workspace.join(&self.settings.retrieval.corpus_dir)
    }

    /// Index path resolved against the workspace.
    pub fn index_path(&self) -> PathBuf {
        self.workspace.join(&self.settings.retrieval.index_path)
    }

    /// Resolve the generative provider API key from its environment variable.
    ///
    /// Ollama needs none and always yields `None`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if self.settings.models.provider.eq_ignore_ascii_case("ollama") {
            return None;
        }
        std::env::var(&self.settings.models.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// Validate the generative model configuration.
    ///
    /// Missing credentials are fatal here, unlike web search where they only
    /// disable the feature.
    pub fn validate(&self) -> AppResult<()> {
        let provider = ProviderType::parse(&self.settings.models.provider).ok_or_else(|| {
            let supported: Vec<&str> = ProviderType::ALL.iter().map(ProviderType::as_str).collect();
            AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.settings.models.provider,
                supported.join(", ")
            ))
        })?;

        if provider != ProviderType::Ollama && self.resolve_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.settings.models.api_key_env
            )));
        }

        Ok(())
    }
}

/// Build the environment layer.
fn env_override() -> AppResult<SettingsOverride> {
    let provider = std::env::var("RAGOMATIC_PROVIDER").ok();
    let model = std::env::var("RAGOMATIC_MODEL").ok();

    let mode = match std::env::var("RAGOMATIC_WEB") {
        Ok(raw) => Some(SearchMode::parse(&raw).ok_or_else(|| {
            AppError::Config(format!(
                "Invalid RAGOMATIC_WEB value '{}'. Expected off, on or always",
                raw
            ))
        })?),
        Err(_) => None,
    };

    Ok(SettingsOverride {
        models: Some(ModelOverride {
            provider,
            model,
            ..Default::default()
        }),
        web_search: Some(WebSearchOverride {
            mode,
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.settings.models.provider, "claude");
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_load_merges_yaml_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".ragomatic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            r#"
logging:
  level: info
  color: false
webSearch:
  backend: hosted-api
  allowFallbackToHosted: true
retrieval:
  corpusDir: transcripts
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(temp.path().to_path_buf()), None).unwrap();

        assert_eq!(config.settings.web_search.backend, "hosted-api");
        assert!(config.settings.web_search.allow_fallback_to_hosted);
        assert_eq!(config.settings.web_search.max_results, 5);
        assert_eq!(config.corpus_dir(), temp.path().join("transcripts"));
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert!(config.no_color);
        assert!(config.config_file.is_some());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(Some(temp.path().to_path_buf()), None).unwrap();

        assert!(config.config_file.is_none());
        assert_eq!(config.index_path(), temp.path().join("data/index.sqlite"));
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(&path, "retrieval: [not, a, mapping").unwrap();

        let result = AppConfig::load(Some(temp.path().to_path_buf()), Some(path));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_rejects_missing_explicit_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("ollama".to_string()),
            Some("llama".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.settings.models.provider, "ollama");
        assert_eq!(config.settings.models.resolve_model(), "llama3.2");
        assert_eq!(config.settings.models.api_key_env, "ANTHROPIC_API_KEY");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.settings.models.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.settings.models.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_validate_accepts_provider_aliases() {
        let mut config = AppConfig::default();
        config.settings.models.provider = "Anthropic".to_string();
        config.settings.models.api_key_env = "RAGOMATIC_TEST_ALIAS_KEY_VAR".to_string();
        std::env::set_var("RAGOMATIC_TEST_ALIAS_KEY_VAR", "sk-test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_claude_requires_key() {
        let mut config = AppConfig::default();
        config.settings.models.api_key_env = "RAGOMATIC_TEST_UNSET_KEY_VAR".to_string();
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("RAGOMATIC_TEST_UNSET_KEY_VAR")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
