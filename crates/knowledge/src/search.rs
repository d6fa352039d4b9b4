//! Diversity-aware selection of retrieved chunks.

use crate::embedding::cosine_similarity;
use crate::types::KnowledgeChunk;

/// Maximal-marginal-relevance selection.
///
/// `candidates` are `(chunk, query_similarity)` pairs, typically the
/// `fetch_k` best by similarity. Picks `k` of them, each step maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity_to_already_picked`.
/// `lambda_mult = 1.0` degenerates to plain top-k.
pub fn mmr_select(
    candidates: Vec<(KnowledgeChunk, f32)>,
    k: usize,
    lambda_mult: f32,
) -> Vec<(KnowledgeChunk, f32)> {
    let lambda = lambda_mult.clamp(0.0, 1.0);
    let mut remaining = candidates;
    let mut selected: Vec<(KnowledgeChunk, f32)> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, (chunk, relevance)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|(picked, _)| similarity(chunk, picked))
                .fold(0.0f32, f32::max);

            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    tracing::debug!(
        "MMR selected {} chunks (k={}, lambda={})",
        selected.len(),
        k,
        lambda
    );

    selected
}

fn similarity(a: &KnowledgeChunk, b: &KnowledgeChunk) -> f32 {
    match (&a.embedding, &b.embedding) {
        (Some(x), Some(y)) => cosine_similarity(x, y),
        _ => 0.0,
    }
}
