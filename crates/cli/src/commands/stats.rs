//! Stats command handler.
//!
//! Shows what the transcript index currently holds.

use clap::Args;
use ragomatic_core::{config::AppConfig, AppResult};
use ragomatic_knowledge::KnowledgeBase;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = KnowledgeBase::from_config(config).stats()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Index: {}", stats.index_path.display());
        if !stats.exists {
            println!("  (not built yet; run `ragomatic index`)");
            return Ok(());
        }

        println!("  Episodes: {}", stats.episodes_count);
        println!("  Chunks: {}", stats.chunks_count);
        println!("  DB size: {} bytes", stats.db_size_bytes);
        println!("  Embedding model: {}", stats.embedding_model);
        if let Some(last_indexed) = stats.last_indexed {
            println!("  Last indexed: {}", last_indexed);
        }

        Ok(())
    }
}
