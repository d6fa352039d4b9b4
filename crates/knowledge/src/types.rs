//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Episode metadata taken from a transcript's front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Transcript path the metadata came from
    #[serde(default)]
    pub source: String,
}

impl EpisodeMetadata {
    pub fn guest_or_default(&self) -> &str {
        self.guest.as_deref().unwrap_or("Unknown")
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn date_or_default(&self) -> &str {
        self.publish_date.as_deref().unwrap_or("Unknown date")
    }
}

/// A transcript loaded from the corpus.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub path: PathBuf,
    pub metadata: EpisodeMetadata,
    pub text: String,
}

/// A chunk produced by the chunker, before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
    pub metadata: EpisodeMetadata,
}

/// A stored chunk with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Owning episode row
    pub episode_id: String,

    /// Position within the transcript
    pub position: u32,

    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub metadata: EpisodeMetadata,
}

/// A chunk returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub metadata: EpisodeMetadata,

    /// Cosine similarity to the query
    pub score: f32,
}

/// Result of an `index_corpus` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Transcripts (re)indexed in this run
    pub episodes_indexed: u32,

    /// Transcripts whose content hash matched the stored one
    pub episodes_unchanged: u32,

    /// Transcripts that failed to load
    pub episodes_skipped: u32,

    pub chunks_count: u32,
    pub bytes_processed: u64,
    pub duration_secs: f64,
}

/// Snapshot of what is stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub index_path: PathBuf,
    pub exists: bool,
    pub episodes_count: u32,
    pub chunks_count: u32,
    pub db_size_bytes: u64,
    pub embedding_model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<DateTime<Utc>>,
}

/// One deduplicated episode citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub guest: String,
    pub title: String,
    pub date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}
