//! Episode citations for retrieved passages.

use crate::types::{Citation, RetrievedPassage};
use std::collections::HashSet;

/// Deduplicate passages by guest and title, keeping retrieval order, and
/// return at most `max` citations.
pub fn citations(passages: &[RetrievedPassage], max: usize) -> Vec<Citation> {
    let mut seen = HashSet::new();

    passages
        .iter()
        .filter_map(|p| {
            let meta = &p.metadata;
            let guest = meta.guest_or_default().to_string();
            let title = meta.title_or_default().to_string();

            if !seen.insert((guest.clone(), title.clone())) {
                return None;
            }

            Some(Citation {
                guest,
                title,
                date: meta.date_or_default().to_string(),
                youtube_url: meta.youtube_url.clone().filter(|u| !u.is_empty()),
            })
        })
        .take(max)
        .collect()
}

/// Render citations as bullet lines, the URL indented on the next line.
///
/// ```text
/// • Guest: "Title" (2023-03-12)
///   https://www.youtube.com/watch?v=...
/// ```
pub fn format_sources(passages: &[RetrievedPassage], max: usize) -> String {
    format_citations(&citations(passages, max))
}

/// Render already-deduplicated citations in the [`format_sources`] layout.
pub fn format_citations(citations: &[Citation]) -> String {
    citations
        .iter()
        .map(|c| {
            let mut line = format!("• {}: \"{}\" ({})", c.guest, c.title, c.date);
            if let Some(url) = &c.youtube_url {
                line.push_str("\n  ");
                line.push_str(url);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
