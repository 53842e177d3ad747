//! Reciprocal Rank Fusion of the lexical and semantic ranked lists.
//!
//! Each item at zero-based rank `r` contributes `1 / (k + r + 1)` to its
//! document's total. Only ranks matter; the producers' raw scores are never
//! compared with each other.

use std::collections::HashMap;

use recall_core::types::{FusedHit, LexicalHit, RrfScore, SemanticHit, SourceKind};

pub const DEFAULT_RRF_K: u32 = 60;

fn contribution(k: u32, rank: usize) -> f32 {
    1.0 / (k as f32 + rank as f32 + 1.0)
}

/// Merge two ranked lists. Output is sorted by fused score, descending; ties
/// keep first-seen order (every lexical id, then ids new in the semantic list).
pub fn fuse(lexical: &[LexicalHit], semantic: &[SemanticHit], k: u32) -> Vec<FusedHit> {
    let mut fused: Vec<FusedHit> = Vec::with_capacity(lexical.len() + semantic.len());
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(lexical.len() + semantic.len());

    let ranked = lexical
        .iter()
        .enumerate()
        .map(|(rank, h)| (SourceKind::Lexical, rank, h.id.as_str()))
        .chain(semantic.iter().enumerate().map(|(rank, h)| (SourceKind::Semantic, rank, h.id.as_str())));

    for (source, rank, id) in ranked {
        let slot = *slots.entry(id).or_insert_with(|| {
            fused.push(FusedHit { id: id.to_string(), score: RrfScore(0.0), lexical_rank: None, semantic_rank: None });
            fused.len() - 1
        });
        let hit = &mut fused[slot];
        hit.score.0 += contribution(k, rank);
        let seen = match source {
            SourceKind::Lexical => &mut hit.lexical_rank,
            SourceKind::Semantic => &mut hit.semantic_rank,
        };
        seen.get_or_insert(rank);
    }

    // Stable: equal scores keep insertion order.
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::types::{Cosine, Overlap};

    fn lex(ids: &[&str]) -> Vec<LexicalHit> {
        ids.iter().map(|id| LexicalHit::new(*id, Overlap(1.0))).collect()
    }

    fn sem(ids: &[&str]) -> Vec<SemanticHit> {
        ids.iter().map(|id| SemanticHit::new(*id, Cosine(0.5))).collect()
    }

    fn ids(hits: &[FusedHit]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn shared_documents_accumulate_both_ranks() {
        let fused = fuse(&lex(&["a", "b"]), &sem(&["b", "c"]), 60);
        assert_eq!(ids(&fused), vec!["b", "a", "c"]);
        let b = &fused[0];
        assert!((b.score.value() - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-7);
        assert_eq!(b.lexical_rank, Some(1));
        assert_eq!(b.semantic_rank, Some(0));
        assert_eq!(b.sources(), vec![SourceKind::Lexical, SourceKind::Semantic]);
    }

    #[test]
    fn equal_scores_keep_lexical_first() {
        let fused = fuse(&lex(&["l0", "l1"]), &sem(&["s0", "s1"]), 60);
        assert_eq!(ids(&fused), vec!["l0", "s0", "l1", "s1"]);
    }

    #[test]
    fn one_empty_list_degrades_to_the_other() {
        let fused = fuse(&lex(&["x", "y"]), &[], DEFAULT_RRF_K);
        assert_eq!(ids(&fused), vec!["x", "y"]);
        assert!(fused.iter().all(|h| h.semantic_rank.is_none()));

        let fused = fuse(&[], &sem(&["p"]), DEFAULT_RRF_K);
        assert_eq!(ids(&fused), vec!["p"]);
        assert!(fuse(&[], &[], DEFAULT_RRF_K).is_empty());
    }

    #[test]
    fn raw_scores_do_not_influence_order() {
        let lexical = vec![LexicalHit::new("a", Overlap(0.01)), LexicalHit::new("b", Overlap(0.99))];
        let fused = fuse(&lexical, &[], 60);
        assert_eq!(ids(&fused), vec!["a", "b"], "rank position wins, not the overlap value");
    }

    #[test]
    fn fusion_is_deterministic() {
        let l = lex(&["a", "b", "c", "d"]);
        let s = sem(&["d", "c", "e"]);
        assert_eq!(fuse(&l, &s, 60), fuse(&l, &s, 60));
    }
}
