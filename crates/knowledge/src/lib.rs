//! Transcript knowledge base.
//!
//! Local-first retrieval over podcast transcripts: front-matter aware
//! loading, overlapping chunks, SQLite storage and MMR retrieval.

pub mod chunker;
pub mod citations;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod progress;
pub mod search;
pub mod types;

pub use citations::{citations, format_citations, format_sources};
pub use embedding::{EmbeddingProvider, TrigramEmbedder};
pub use progress::{ProgressEvent, ProgressReporter};
pub use types::{
    Citation, EpisodeMetadata, IndexStats, KnowledgeChunk, KnowledgeStats, RetrievedPassage,
};

use chrono::Utc;
use ragomatic_core::{AppConfig, AppError, AppResult, RetrievalSettings};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const EMBEDDING_MODEL_KEY: &str = "embedding_model";

/// Anything that can turn a question into ranked passages.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>>;
}

/// SQLite-backed transcript index.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    corpus_dir: PathBuf,
    index_path: PathBuf,
    settings: RetrievalSettings,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl KnowledgeBase {
    pub fn new(corpus_dir: PathBuf, index_path: PathBuf, settings: RetrievalSettings) -> Self {
        Self {
            corpus_dir,
            index_path,
            settings,
            embedder: Arc::new(TrigramEmbedder::default()),
        }
    }

    /// Build from resolved configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.corpus_dir(),
            config.index_path(),
            config.settings.retrieval.clone(),
        )
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_corpus_dir(mut self, corpus_dir: PathBuf) -> Self {
        self.corpus_dir = corpus_dir;
        self
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Index every transcript in the corpus.
    ///
    /// Unchanged transcripts (same content hash) are skipped, changed ones
    /// are re-chunked, and episodes whose transcript disappeared are removed.
    /// `reset` wipes the index first.
    pub async fn index_corpus(
        &self,
        reset: bool,
        progress: &ProgressReporter,
    ) -> AppResult<IndexStats> {
        let start = Instant::now();
        tracing::info!("Indexing corpus {:?} into {:?}", self.corpus_dir, self.index_path);

        let corpus = corpus::load_transcripts(&self.corpus_dir)?;
        progress.load(corpus.transcripts.len() as u64, corpus.skipped as u64);

        let mut conn = index::init_index(&self.index_path)?;
        if reset {
            index::reset_index(&conn)?;
        }

        if let Some(stored) = index::get_meta(&conn, EMBEDDING_MODEL_KEY)? {
            if stored != self.embedder.model_name() {
                tracing::warn!(
                    "Index was built with '{}', now using '{}'; resetting",
                    stored,
                    self.embedder.model_name()
                );
                index::reset_index(&conn)?;
            }
        }

        let mut stats = IndexStats {
            episodes_skipped: corpus.skipped,
            ..Default::default()
        };

        let total = corpus.transcripts.len() as u64;
        let mut present = HashSet::new();

        for (i, transcript) in corpus.transcripts.iter().enumerate() {
            let source = transcript.metadata.source.clone();
            present.insert(source.clone());
            progress.episode(i as u64 + 1, total, &source);

            let content_hash = hash_content(&transcript.text);
            let existing = index::find_episode(&conn, &source)?;

            if let Some(existing) = &existing {
                if existing.content_hash == content_hash {
                    stats.episodes_unchanged += 1;
                    continue;
                }
            }

            let candidates = chunker::chunk_text(
                &transcript.text,
                &transcript.metadata,
                self.settings.chunk_size,
                self.settings.chunk_overlap,
            );
            let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            progress.embed(i as u64 + 1, total, texts.len(), self.embedder.model_name());

            let tx = conn
                .transaction()
                .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

            if let Some(existing) = &existing {
                index::delete_episode(&tx, &existing.id)?;
            }

            let episode = index::EpisodeRecord {
                id: uuid::Uuid::new_v4().to_string(),
                source,
                content_hash,
                metadata: transcript.metadata.clone(),
                indexed_at: Utc::now(),
            };
            index::insert_episode(&tx, &episode)?;

            for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
                index::insert_chunk(
                    &tx,
                    &KnowledgeChunk {
                        id: uuid::Uuid::new_v4().to_string(),
                        episode_id: episode.id.clone(),
                        position: candidate.position,
                        text: candidate.text,
                        embedding: Some(embedding),
                        metadata: candidate.metadata,
                    },
                )?;
                stats.chunks_count += 1;
            }

            tx.commit()
                .map_err(|e| AppError::Knowledge(format!("Failed to commit episode: {}", e)))?;

            stats.episodes_indexed += 1;
            stats.bytes_processed += transcript.text.len() as u64;
        }

        for (id, source) in index::list_sources(&conn)? {
            if !present.contains(&source) {
                tracing::info!("Removing episode no longer in corpus: {}", source);
                index::delete_episode(&conn, &id)?;
            }
        }

        index::set_meta(&conn, EMBEDDING_MODEL_KEY, self.embedder.model_name())?;

        stats.duration_secs = start.elapsed().as_secs_f64();
        progress.done(stats.episodes_indexed as u64, stats.chunks_count as u64);

        tracing::info!(
            "Indexed {} episodes ({} unchanged, {} skipped), {} chunks in {:.2}s",
            stats.episodes_indexed,
            stats.episodes_unchanged,
            stats.episodes_skipped,
            stats.chunks_count,
            stats.duration_secs
        );

        Ok(stats)
    }

    /// Retrieve the `k` most relevant, mutually diverse passages.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>> {
        if !self.index_path.exists() {
            return Err(AppError::Knowledge(format!(
                "Index not found at {}. Run `ragomatic index` first",
                self.index_path.display()
            )));
        }

        let conn = index::init_index(&self.index_path)?;
        let query_embedding = self.embedder.embed(query).await?;

        let fetch_k = self.settings.fetch_k.max(k);
        let min_score = self.settings.min_score;
        let candidates: Vec<_> = index::query_chunks(&conn, &query_embedding, fetch_k)?
            .into_iter()
            .filter(|(_, score)| *score >= min_score)
            .collect();

        let selected = search::mmr_select(candidates, k, self.settings.lambda_mult);

        tracing::debug!("Retrieved {} passages for query", selected.len());

        Ok(selected
            .into_iter()
            .map(|(chunk, score)| RetrievedPassage {
                text: chunk.text,
                metadata: chunk.metadata,
                score,
            })
            .collect())
    }

    /// Summarize what is stored in the index.
    pub fn stats(&self) -> AppResult<KnowledgeStats> {
        let mut stats = KnowledgeStats {
            index_path: self.index_path.clone(),
            exists: self.index_path.exists(),
            episodes_count: 0,
            chunks_count: 0,
            db_size_bytes: 0,
            embedding_model: self.embedder.model_name().to_string(),
            last_indexed: None,
        };

        if !stats.exists {
            return Ok(stats);
        }

        let conn = index::init_index(&self.index_path)?;
        let (episodes, chunks) = index::get_stats(&conn)?;
        stats.episodes_count = episodes;
        stats.chunks_count = chunks;
        stats.db_size_bytes = std::fs::metadata(&self.index_path)?.len();
        stats.last_indexed = index::last_indexed(&conn)?;
        if let Some(model) = index::get_meta(&conn, EMBEDDING_MODEL_KEY)? {
            stats.embedding_model = model;
        }

        Ok(stats)
    }

    /// Delete the index file. Returns whether anything was removed.
    pub fn clean(&self) -> AppResult<bool> {
        if !self.index_path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&self.index_path)?;
        tracing::info!("Removed index {:?}", self.index_path);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl Retriever for KnowledgeBase {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>> {
        KnowledgeBase::retrieve(self, query, k).await
    }
}

fn hash_content(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_episode(root: &Path, name: &str, guest: &str, body: &str) {
        let dir = root.join("episodes").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("transcript.md"),
            format!(
                "---\nguest: {}\ntitle: \"{} on things\"\npublish_date: 2024-01-01\n---\n{}",
                guest, guest, body
            ),
        )
        .unwrap();
    }

    fn knowledge_base(root: &Path) -> KnowledgeBase {
        let settings = RetrievalSettings {
            chunk_size: 200,
            chunk_overlap: 40,
            ..Default::default()
        };
        KnowledgeBase::new(
            root.join("episodes"),
            root.join("data/index.sqlite"),
            settings,
        )
    }

    fn seed(root: &Path) {
        write_episode(
            root,
            "pricing",
            "Madhavan",
            &"Pricing starts with willingness to pay. Talk about monetization early. ".repeat(6),
        );
        write_episode(
            root,
            "hiring",
            "Elena",
            &"Hiring great engineers needs structured interviews and calibrated loops. "
                .repeat(6),
        );
    }

    #[tokio::test]
    async fn test_index_and_retrieve() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let kb = knowledge_base(temp.path());

        let stats = kb.index_corpus(false, &ProgressReporter::noop()).await.unwrap();
        assert_eq!(stats.episodes_indexed, 2);
        assert!(stats.chunks_count >= 4);

        let passages = kb.retrieve("What about pricing and willingness to pay?", 2).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].metadata.guest.as_deref(), Some("Madhavan"));
    }

    #[tokio::test]
    async fn test_reindex_skips_unchanged_and_drops_removed() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let kb = knowledge_base(temp.path());
        let progress = ProgressReporter::noop();

        kb.index_corpus(false, &progress).await.unwrap();
        let again = kb.index_corpus(false, &progress).await.unwrap();
        assert_eq!(again.episodes_indexed, 0);
        assert_eq!(again.episodes_unchanged, 2);

        fs::remove_dir_all(temp.path().join("episodes/hiring")).unwrap();
        kb.index_corpus(false, &progress).await.unwrap();
        assert_eq!(kb.stats().unwrap().episodes_count, 1);

        let reset = kb.index_corpus(true, &progress).await.unwrap();
        assert_eq!(reset.episodes_indexed, 1);
    }

    #[tokio::test]
    async fn test_retrieve_without_index_explains_remediation() {
        let temp = TempDir::new().unwrap();
        let kb = knowledge_base(temp.path());

        let err = kb.retrieve("anything", 5).await.unwrap_err();
        assert!(err.to_string().contains("ragomatic index"));
    }

    #[tokio::test]
    async fn test_stats_and_clean() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let kb = knowledge_base(temp.path());

        let empty = kb.stats().unwrap();
        assert!(!empty.exists);
        assert_eq!(empty.chunks_count, 0);

        kb.index_corpus(false, &ProgressReporter::noop()).await.unwrap();
        let stats = kb.stats().unwrap();
        assert!(stats.exists);
        assert_eq!(stats.episodes_count, 2);
        assert_eq!(stats.embedding_model, "trigram-v1");
        assert!(stats.last_indexed.is_some());

        assert!(kb.clean().unwrap());
        assert!(!kb.clean().unwrap());
    }

    #[tokio::test]
    async fn test_retriever_trait_object() {
        let temp = TempDir::new().unwrap();
        seed(temp.path());
        let kb = knowledge_base(temp.path());
        kb.index_corpus(false, &ProgressReporter::noop()).await.unwrap();

        let retriever: Arc<dyn Retriever> = Arc::new(kb);
        let passages = retriever.retrieve("structured interviews", 1).await.unwrap();
        assert_eq!(passages[0].metadata.guest.as_deref(), Some("Elena"));
    }
}
