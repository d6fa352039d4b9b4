//! SQLite-backed vector index for transcript chunks.

use crate::embedding::cosine_similarity;
use crate::types::{EpisodeMetadata, KnowledgeChunk};
use chrono::{DateTime, Utc};
use ragomatic_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A stored episode row.
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    pub id: String,
    pub source: String,
    pub content_hash: String,
    pub metadata: EpisodeMetadata,
    pub indexed_at: DateTime<Utc>,
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> AppError + '_ {
    move |e| AppError::Knowledge(format!("{}: {}", context, e))
}

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path).map_err(db_err("Failed to open SQLite index"))?;

    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS episodes (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL UNIQUE,
            content_hash TEXT NOT NULL,
            metadata TEXT NOT NULL,
            indexed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            episode_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (episode_id) REFERENCES episodes(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_episode ON chunks(episode_id);

        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .map_err(db_err("Failed to create tables"))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Look up an episode by transcript path.
pub fn find_episode(conn: &Connection, source: &str) -> AppResult<Option<EpisodeRecord>> {
    let row = conn
        .query_row(
            "SELECT id, source, content_hash, metadata, indexed_at FROM episodes WHERE source = ?1",
            params![source],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()
        .map_err(db_err("Failed to look up episode"))?;

    row.map(|(id, source, content_hash, metadata, indexed_at)| {
        Ok(EpisodeRecord {
            id,
            source,
            content_hash,
            metadata: serde_json::from_str(&metadata)?,
            indexed_at: parse_timestamp(&indexed_at)?,
        })
    })
    .transpose()
}

/// Insert an episode row.
pub fn insert_episode(conn: &Connection, episode: &EpisodeRecord) -> AppResult<()> {
    let metadata_json = serde_json::to_string(&episode.metadata)?;

    conn.execute(
        "INSERT OR REPLACE INTO episodes (id, source, content_hash, metadata, indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            episode.id,
            episode.source,
            episode.content_hash,
            metadata_json,
            episode.indexed_at.to_rfc3339(),
        ],
    )
    .map_err(db_err("Failed to insert episode"))?;

    Ok(())
}

/// `(id, source)` of every stored episode.
pub fn list_sources(conn: &Connection) -> AppResult<Vec<(String, String)>> {
    let mut stmt = conn
        .prepare("SELECT id, source FROM episodes ORDER BY source")
        .map_err(db_err("Failed to prepare episode listing"))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(db_err("Failed to list episodes"))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(db_err("Failed to read episode row"))
}

/// Delete an episode and its chunks.
pub fn delete_episode(conn: &Connection, episode_id: &str) -> AppResult<()> {
    conn.execute("DELETE FROM chunks WHERE episode_id = ?1", params![episode_id])
        .map_err(db_err("Failed to delete chunks"))?;
    conn.execute("DELETE FROM episodes WHERE id = ?1", params![episode_id])
        .map_err(db_err("Failed to delete episode"))?;
    Ok(())
}

/// Insert a chunk with embedding into the index.
pub fn insert_chunk(conn: &Connection, chunk: &KnowledgeChunk) -> AppResult<()> {
    let embedding = chunk
        .embedding
        .as_ref()
        .ok_or_else(|| AppError::Knowledge("Chunk missing embedding".to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO chunks (id, episode_id, position, text, embedding)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            chunk.id,
            chunk.episode_id,
            chunk.position as i64,
            chunk.text,
            embedding_to_bytes(embedding),
        ],
    )
    .map_err(db_err("Failed to insert chunk"))?;

    Ok(())
}

/// Score every stored chunk against the query and return the `top_k` best.
///
/// Returned chunks keep their embeddings so callers can rerank.
pub fn query_chunks(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.episode_id, c.position, c.text, c.embedding, e.metadata
             FROM chunks c JOIN episodes e ON e.id = c.episode_id",
        )
        .map_err(db_err("Failed to prepare query"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(db_err("Failed to query chunks"))?;

    let mut results = Vec::new();
    for row in rows {
        let (id, episode_id, position, text, embedding_bytes, metadata_json) =
            row.map_err(db_err("Failed to read chunk row"))?;

        let embedding = match bytes_to_embedding(&embedding_bytes) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Skipping chunk {}: {}", id, e);
                continue;
            }
        };
        let score = cosine_similarity(query_embedding, &embedding);

        results.push((
            KnowledgeChunk {
                id,
                episode_id,
                position: position as u32,
                text,
                embedding: Some(embedding),
                metadata: serde_json::from_str(&metadata_json)?,
            },
            score,
        ));
    }

    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);

    tracing::debug!(
        "Retrieved {} chunks (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

/// Count episodes and chunks.
pub fn get_stats(conn: &Connection) -> AppResult<(u32, u32)> {
    let episodes: i64 = conn
        .query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))
        .map_err(db_err("Failed to count episodes"))?;

    let chunks: i64 = conn
        .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
        .map_err(db_err("Failed to count chunks"))?;

    Ok((episodes as u32, chunks as u32))
}

/// Most recent `indexed_at` across episodes.
pub fn last_indexed(conn: &Connection) -> AppResult<Option<DateTime<Utc>>> {
    let latest: Option<String> = conn
        .query_row("SELECT MAX(indexed_at) FROM episodes", [], |row| row.get(0))
        .map_err(db_err("Failed to read last indexed time"))?;

    latest.as_deref().map(parse_timestamp).transpose()
}

/// Read a value from the `index_meta` table.
pub fn get_meta(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM index_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(db_err("Failed to read index metadata"))
}

/// Write a value to the `index_meta` table.
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(db_err("Failed to write index metadata"))?;
    Ok(())
}

/// Reset the index (delete all data).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("DELETE FROM chunks; DELETE FROM episodes; DELETE FROM index_meta;")
        .map_err(db_err("Failed to reset index"))?;

    tracing::info!("Reset transcript index");
    Ok(())
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Knowledge(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
