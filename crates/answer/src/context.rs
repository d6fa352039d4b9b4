//! Prompt context rendering.

use ragomatic_knowledge::RetrievedPassage;
use ragomatic_websearch::SearchResult;

/// Render retrieved passages as numbered, attributed excerpts.
pub fn render_corpus_context(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return "(no transcript excerpts matched the question)".to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "[Excerpt {}] {}, \"{}\" ({})\n{}",
                i + 1,
                p.metadata.guest_or_default(),
                p.metadata.title_or_default(),
                p.metadata.date_or_default(),
                p.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Render web results as a numbered block. Missing fields are left out.
pub fn render_web_block(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut lines = vec![format!(
                "{}. {}",
                i + 1,
                r.title.as_deref().unwrap_or("(untitled)")
            )];
            if let Some(snippet) = &r.snippet {
                lines.push(format!("   {}", snippet));
            }
            if let Some(link) = &r.link {
                lines.push(format!("   Source: {}", link));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
