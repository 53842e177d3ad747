//! Maximal Marginal Relevance re-ranking over the head of the fused list.
//!
//! Each round picks the candidate maximizing
//! `lambda * sim(query, d) - (1 - lambda) * max(sim(d, s) for s in selected)`.
//! The first pick is simply the candidate most similar to the query.

use tracing::debug;

use recall_core::types::{Cosine, DocumentId, FusedHit};
use recall_vector::{dot, l2_normalize};

pub const DEFAULT_POOL_SIZE: usize = 8;
pub const DEFAULT_LAMBDA: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmrParams {
    pub top_k: usize,
    pub pool_size: usize,
    pub lambda: f32,
}

impl Default for MmrParams {
    fn default() -> Self {
        Self { top_k: 3, pool_size: DEFAULT_POOL_SIZE, lambda: DEFAULT_LAMBDA }
    }
}

struct Candidate<'a> {
    id: &'a str,
    vector: Vec<f32>,
    sim_query: f32,
}

/// Select up to `min(top_k, pool_size)` distinct documents from the first
/// `pool_size` fused hits. `embedding_of` supplies each candidate's vector;
/// candidates without one are skipped. Returned scores are the query cosine
/// similarities, in selection order.
pub fn diversify<'v, F>(fused: &[FusedHit], query: &[f32], embedding_of: F, params: &MmrParams) -> Vec<(DocumentId, Cosine)>
where
    F: Fn(&str) -> Option<&'v [f32]>,
{
    if params.top_k == 0 || fused.is_empty() {
        return Vec::new();
    }

    let mut q = query.to_vec();
    l2_normalize(&mut q);

    let mut pool: Vec<Candidate<'_>> = Vec::with_capacity(params.pool_size.min(fused.len()));
    for hit in fused.iter().take(params.pool_size) {
        match embedding_of(&hit.id) {
            Some(v) if v.len() == q.len() => {
                let mut vector = v.to_vec();
                l2_normalize(&mut vector);
                let sim_query = dot(&vector, &q);
                pool.push(Candidate { id: &hit.id, vector, sim_query });
            }
            _ => debug!(id = %hit.id, "candidate has no usable embedding, skipped"),
        }
    }
    if pool.is_empty() {
        return Vec::new();
    }

    let want = params.top_k.min(pool.len());
    let mut selected: Vec<usize> = Vec::with_capacity(want);
    let mut remaining: Vec<usize> = (0..pool.len()).collect();

    // Strict `>` keeps the earliest pool position on ties.
    let first = argmax(&remaining, |c| pool[c].sim_query);
    selected.push(remaining.remove(first));

    while selected.len() < want {
        let slot = argmax(&remaining, |c| {
            let redundancy = selected
                .iter()
                .map(|&s| dot(&pool[c].vector, &pool[s].vector))
                .fold(f32::NEG_INFINITY, f32::max);
            params.lambda * pool[c].sim_query - (1.0 - params.lambda) * redundancy
        });
        selected.push(remaining.remove(slot));
    }

    selected
        .into_iter()
        .map(|c| (pool[c].id.to_string(), Cosine(pool[c].sim_query)))
        .collect()
}

/// Position in `candidates` of the highest score; first wins on ties, NaN never wins.
fn argmax(candidates: &[usize], score: impl Fn(usize) -> f32) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (slot, &c) in candidates.iter().enumerate() {
        let s = score(c);
        if s > best_score {
            best = slot;
            best_score = s;
        }
    }
    best
}
