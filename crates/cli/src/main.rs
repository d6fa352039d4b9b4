//! RAG-o-Matic CLI
//!
//! Main entry point for the `ragomatic` command-line tool: question
//! answering over a podcast transcript corpus with optional web augmentation.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, DoctorCommand, IndexCommand, StatsCommand};
use ragomatic_core::{
    config::AppConfig,
    logging::{self, LogFile, LogFormat},
    AppError,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// RAG-o-Matic - answers from your podcast transcripts, with web backup
#[derive(Parser, Debug)]
#[command(name = "ragomatic")]
#[command(about = "Question answering over podcast transcripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGOMATIC_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: .ragomatic/config.yaml)
    #[arg(short, long, global = true, env = "RAGOMATIC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generative provider (claude, ollama)
    #[arg(short, long, global = true, env = "RAGOMATIC_PROVIDER")]
    provider: Option<String>,

    /// Model id or catalog alias (haiku, sonnet, llama)
    #[arg(short, long, global = true, env = "RAGOMATIC_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about the corpus
    Ask(AskCommand),

    /// Build or refresh the transcript index
    Index(IndexCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Check model credentials, web search and the index
    Doctor(DoctorCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Index(_) => "index",
            Commands::Stats(_) => "stats",
            Commands::Doctor(_) => "doctor",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let log_format = LogFormat::parse(&cli.log_format).ok_or_else(|| {
        AppError::Config(format!(
            "Invalid log format '{}'. Expected pretty or json",
            cli.log_format
        ))
    })?;

    let config = AppConfig::load(cli.workspace, cli.config)
        .context("Failed to load configuration")?
        .with_overrides(
            cli.provider,
            cli.model,
            cli.log_level,
            cli.verbose,
            cli.no_color,
        );

    let log_file = match &cli.command {
        Commands::Index(cmd) if !cmd.no_log_file => Some(
            LogFile::create(&config.workspace.join(logging::LOG_DIR), "index")
                .context("Failed to create index log file")?,
        ),
        _ => None,
    };
    let log_path = log_file.as_ref().map(|f| f.path().to_path_buf());

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        log_format,
        log_file,
    )?;

    if let Some(path) = &log_path {
        eprintln!("Logging to: {}", path.display());
        tracing::info!("Log file: {}", path.display());
    }

    tracing::info!("RAG-o-Matic starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.settings.models.provider);
    tracing::debug!("Model: {}", config.settings.models.resolve_model());

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Doctor(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    Ok(result?)
}

/// Print the failure to stderr. Generative failures get remediation hints
/// instead of the raw provider message.
fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<AppError>() {
        Some(app_err) if app_err.is_llm() => {
            eprintln!("Error: the answer could not be generated.");
            eprintln!("  {}", app_err);
            eprintln!();
            eprintln!("If you are seeing API errors, check:");
            eprintln!("  - Your API key is set in the configured environment variable");
            eprintln!("  - You have API credits available");
        }
        _ => eprintln!("Error: {:#}", err),
    }
}
