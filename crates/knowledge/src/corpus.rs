//! Transcript corpus loading.
//!
//! The corpus is a directory of episodes, each holding a `transcript.md`
//! whose YAML front matter carries the episode metadata.

use crate::types::{EpisodeMetadata, Transcript};
use ragomatic_core::{AppError, AppResult};
use serde_yaml::Value;
use std::path::Path;
use walkdir::WalkDir;

const TRANSCRIPT_FILE: &str = "transcript.md";
const FENCE: &str = "---";

/// Transcripts found under a corpus directory.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub transcripts: Vec<Transcript>,

    /// Files that were found but could not be loaded
    pub skipped: u32,
}

/// Load every `*/transcript.md` under `corpus_dir`.
///
/// Files that fail to load are logged and skipped.
pub fn load_transcripts(corpus_dir: &Path) -> AppResult<LoadedCorpus> {
    if !corpus_dir.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Corpus directory not found: {}. Run from the repository root or pass --corpus",
            corpus_dir.display()
        )));
    }

    let mut paths: Vec<_> = WalkDir::new(corpus_dir)
        .min_depth(2)
        .max_depth(2)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == TRANSCRIPT_FILE)
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    tracing::info!("Found {} transcript files in {:?}", paths.len(), corpus_dir);

    let mut corpus = LoadedCorpus::default();
    for path in paths {
        match load_transcript(&path) {
            Ok(transcript) => corpus.transcripts.push(transcript),
            Err(e) => {
                tracing::warn!("Failed to load {:?}: {}", path, e);
                corpus.skipped += 1;
            }
        }
    }

    Ok(corpus)
}

/// Load a single transcript, splitting off its front matter.
pub fn load_transcript(path: &Path) -> AppResult<Transcript> {
    let raw = std::fs::read_to_string(path)?;
    let (front_matter, body) = split_front_matter(&raw);

    let mut metadata = match front_matter {
        Some(yaml) => parse_metadata(yaml)?,
        None => EpisodeMetadata::default(),
    };
    metadata.source = path.display().to_string();

    Ok(Transcript {
        path: path.to_path_buf(),
        metadata,
        text: body.to_string(),
    })
}

/// Split `---` fenced front matter from the body.
///
/// Content without a leading fence, or with an unterminated one, is all body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    if let Some(rest) = content.strip_prefix(FENCE) {
        if let Some(end) = rest.find(FENCE) {
            let yaml = &rest[..end];
            let body = rest[end + FENCE.len()..].trim();
            return (Some(yaml), body);
        }
    }
    (None, content)
}

fn parse_metadata(yaml: &str) -> AppResult<EpisodeMetadata> {
    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Knowledge(format!("Invalid front matter: {}", e)))?;

    if value.is_null() {
        return Ok(EpisodeMetadata::default());
    }

    let mapping = value
        .as_mapping()
        .ok_or_else(|| AppError::Knowledge("Front matter is not a mapping".to_string()))?;

    let field = |key: &str| mapping.get(key).and_then(scalar_text);

    let keywords = match mapping.get("keywords") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(list)) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Ok(EpisodeMetadata {
        guest: field("guest"),
        title: field("title"),
        publish_date: field("publish_date"),
        youtube_url: field("youtube_url"),
        keywords,
        source: String::new(),
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EPISODE: &str = r#"---
guest: Madhavan Ramanujam
title: "Pricing your product"
publish_date: 2023-03-12
youtube_url: https://www.youtube.com/watch?v=abc
keywords:
  - pricing
  - monetization
---

Lenny: Welcome back.
Madhavan: Talk about willingness to pay before you build.
"#;

    fn write_episode(root: &Path, name: &str, content: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TRANSCRIPT_FILE), content).unwrap();
    }

    #[test]
    fn test_split_front_matter() {
        let (yaml, body) = split_front_matter(EPISODE);
        assert!(yaml.unwrap().contains("guest: Madhavan"));
        assert!(body.starts_with("Lenny: Welcome back."));
    }

    #[test]
    fn test_split_without_front_matter() {
        let (yaml, body) = split_front_matter("just text");
        assert!(yaml.is_none());
        assert_eq!(body, "just text");

        let (yaml, _) = split_front_matter("---\nunterminated");
        assert!(yaml.is_none());
    }

    #[test]
    fn test_load_transcripts_reads_metadata() {
        let temp = TempDir::new().unwrap();
        write_episode(temp.path(), "madhavan-ramanujam", EPISODE);
        write_episode(temp.path(), "no-front-matter", "plain transcript");
        fs::write(temp.path().join("README.md"), "not an episode").unwrap();

        let corpus = load_transcripts(temp.path()).unwrap();
        assert_eq!(corpus.transcripts.len(), 2);
        assert_eq!(corpus.skipped, 0);

        let episode = &corpus.transcripts[0];
        assert_eq!(episode.metadata.guest.as_deref(), Some("Madhavan Ramanujam"));
        assert_eq!(episode.metadata.publish_date.as_deref(), Some("2023-03-12"));
        assert_eq!(episode.metadata.keywords, vec!["pricing", "monetization"]);
        assert!(episode.metadata.source.ends_with(TRANSCRIPT_FILE));

        assert_eq!(corpus.transcripts[1].metadata.guest, None);
    }

    #[test]
    fn test_broken_front_matter_is_skipped() {
        let temp = TempDir::new().unwrap();
        write_episode(temp.path(), "good", EPISODE);
        write_episode(temp.path(), "bad", "---\n- just\n- a list\n---\nbody");

        let corpus = load_transcripts(temp.path()).unwrap();
        assert_eq!(corpus.transcripts.len(), 1);
        assert_eq!(corpus.skipped, 1);
    }

    #[test]
    fn test_missing_corpus_dir() {
        let temp = TempDir::new().unwrap();
        let err = load_transcripts(&temp.path().join("episodes")).unwrap_err();
        assert!(err.to_string().contains("Corpus directory not found"));
    }
}
