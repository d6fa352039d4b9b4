//! Index command handler.
//!
//! Builds or refreshes the SQLite transcript index.

use clap::Args;
use ragomatic_core::{config::AppConfig, AppResult};
use ragomatic_knowledge::{KnowledgeBase, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Build or refresh the transcript index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Corpus directory (default: retrieval.corpusDir from config)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Drop the existing index before indexing
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the per-run log file under logs/
    #[arg(long)]
    pub no_log_file: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let mut knowledge = KnowledgeBase::from_config(config);
        if let Some(corpus) = &self.corpus {
            knowledge = knowledge.with_corpus_dir(config.workspace.join(corpus));
        }

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple())
            }))
        };

        let stats = knowledge.index_corpus(self.reset, &progress).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Indexed {} episodes ({} unchanged, {} skipped): {} chunks, {} bytes in {:.2}s",
                stats.episodes_indexed,
                stats.episodes_unchanged,
                stats.episodes_skipped,
                stats.chunks_count,
                stats.bytes_processed,
                stats.duration_secs
            );
            println!("Index: {}", knowledge.index_path().display());
        }

        Ok(())
    }
}
