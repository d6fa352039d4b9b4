//! Doctor command handler.
//!
//! Runs the same checks `ask` depends on (model credentials, web search
//! provider resolution, corpus and index) and reports each one.

use clap::Args;
use ragomatic_core::{config::AppConfig, AppError, AppResult, SearchMode};
use ragomatic_knowledge::KnowledgeBase;
use ragomatic_websearch::{HealthProbe, ProviderResolver, SystemProbe};
use serde::Serialize;
use std::time::Duration;

/// Check model credentials, web search and the index
#[derive(Args, Debug)]
pub struct DoctorCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    #[serde(flatten)]
    pub status: HealthStatus,

    /// Extra context shown next to a passing check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthCheck {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Pass,
            detail: Some(detail.into()),
        }
    }

    fn warn(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Warn(message.into()),
            detail: None,
        }
    }

    fn fail(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Fail(message.into()),
            detail: None,
        }
    }
}

impl DoctorCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing doctor command");

        let web = &config.settings.web_search;
        let probe = SystemProbe::new(
            web.runtime_command.as_str(),
            Duration::from_secs(web.timeout_secs),
        );
        let checks = run_diagnostics(config, &probe).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&checks)?);
        } else {
            display_results(&checks);
        }

        if overall_status(&checks) {
            Ok(())
        } else {
            Err(AppError::Other("One or more checks failed".to_string()))
        }
    }
}

/// Run all health checks
pub async fn run_diagnostics(config: &AppConfig, probe: &dyn HealthProbe) -> Vec<HealthCheck> {
    vec![
        check_model(config),
        check_web_search(config, probe).await,
        check_corpus(config),
        check_index(config),
    ]
}

fn check_model(config: &AppConfig) -> HealthCheck {
    let models = &config.settings.models;
    match config.validate() {
        Ok(()) => HealthCheck::pass(
            "Model",
            format!("{} / {}", models.provider, models.resolve_model()),
        ),
        Err(e) => HealthCheck::fail("Model", e.to_string()),
    }
}

async fn check_web_search(config: &AppConfig, probe: &dyn HealthProbe) -> HealthCheck {
    let settings = &config.settings.web_search;
    if settings.mode == SearchMode::Off {
        return HealthCheck::pass("Web search", "off");
    }

    let outcome = ProviderResolver::new(settings, probe).resolve(None, None).await;
    match (outcome.backend, outcome.diagnostics.is_empty()) {
        (Some(backend), true) => HealthCheck::pass("Web search", backend.as_str()),
        (Some(_), false) | (None, _) => {
            HealthCheck::warn("Web search", outcome.diagnostics.join("; "))
        }
    }
}

fn check_corpus(config: &AppConfig) -> HealthCheck {
    let corpus_dir = config.corpus_dir();
    if corpus_dir.is_dir() {
        HealthCheck::pass("Corpus", corpus_dir.display().to_string())
    } else {
        HealthCheck::warn(
            "Corpus",
            format!("Corpus directory not found: {}", corpus_dir.display()),
        )
    }
}

fn check_index(config: &AppConfig) -> HealthCheck {
    match KnowledgeBase::from_config(config).stats() {
        Ok(stats) if stats.exists => HealthCheck::pass(
            "Index",
            format!(
                "{} episodes, {} chunks",
                stats.episodes_count, stats.chunks_count
            ),
        ),
        Ok(stats) => HealthCheck::warn(
            "Index",
            format!(
                "No index at {}; run `ragomatic index`",
                stats.index_path.display()
            ),
        ),
        Err(e) => HealthCheck::fail("Index", e.to_string()),
    }
}

/// Display diagnostics results
pub fn display_results(checks: &[HealthCheck]) {
    println!();
    println!("RAG-o-Matic diagnostics");
    println!();
    println!("{:<14} Status", "Check");
    println!("{}", "=".repeat(50));

    for check in checks {
        let message = match &check.status {
            HealthStatus::Pass => match &check.detail {
                Some(detail) => format!("PASS ({})", detail),
                None => "PASS".to_string(),
            },
            HealthStatus::Warn(msg) => format!("WARN: {}", msg),
            HealthStatus::Fail(msg) => format!("FAIL: {}", msg),
        };

        println!("{:<14} {}", check.name, message);
    }

    println!();
}

/// Warnings do not fail the run.
pub fn overall_status(checks: &[HealthCheck]) -> bool {
    !checks
        .iter()
        .any(|c| matches!(c.status, HealthStatus::Fail(_)))
}
