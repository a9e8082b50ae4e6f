//! Maximal marginal relevance selection.
//!
//! Picks `k` results that are relevant to the query but not redundant with
//! each other. Candidates are first narrowed to the `fetch_k` most similar
//! to the query, then chosen greedily by
//!
//! ```text
//! score(c) = λ · sim(query, c) − (1 − λ) · max sim(c, selected)
//! ```
//!
//! λ = 1 reduces to plain top-k; λ = 0 maximizes diversity.

use std::cmp::Ordering;

/// Cosine similarity; 0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Select up to `k` candidate indices in selection order.
///
/// `fetch_k` smaller than `k` is raised to `k`. Ties go to the candidate
/// with the better relevance rank, which in turn keeps insertion order for
/// equal relevance.
pub fn mmr_select(
    query: &[f32],
    candidates: &[&[f32]],
    k: usize,
    fetch_k: usize,
    lambda: f32,
) -> Vec<usize> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);

    let mut ranked: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cosine_similarity(query, c)))
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(fetch_k.max(k));

    let target = k.min(ranked.len());
    let mut selected: Vec<usize> = Vec::with_capacity(target);
    let mut remaining = ranked;

    while selected.len() < target {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &(idx, relevance)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(candidates[idx], candidates[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        let (idx, _) = remaining.remove(best_pos);
        selected.push(idx);
    }

    selected
}
