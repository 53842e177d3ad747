use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use recall_core::types::{Cosine, LexicalHit, Overlap, SemanticHit};
use recall_hybrid::{diversify, fuse, MmrParams, QueryCache};

fn ranked_ids() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence((0..12).map(|i| format!("d{i}")).collect::<Vec<_>>(), 0..=12).prop_shuffle()
}

fn vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, 4)
}

proptest! {
    #[test]
    fn fusion_covers_the_union_once_and_is_sorted(lex in ranked_ids(), sem in ranked_ids(), k in 1u32..100) {
        let lexical: Vec<LexicalHit> = lex.iter().map(|id| LexicalHit::new(id.clone(), Overlap(0.5))).collect();
        let semantic: Vec<SemanticHit> = sem.iter().map(|id| SemanticHit::new(id.clone(), Cosine(0.5))).collect();
        let fused = fuse(&lexical, &semantic, k);

        let union: HashSet<&String> = lex.iter().chain(sem.iter()).collect();
        let ids: HashSet<&String> = fused.iter().map(|h| &h.id).collect();
        prop_assert_eq!(ids.len(), fused.len());
        prop_assert_eq!(ids, union);
        for pair in fused.windows(2) {
            prop_assert!(pair[0].score.value() >= pair[1].score.value());
        }
        prop_assert_eq!(&fused, &fuse(&lexical, &semantic, k));
    }

    #[test]
    fn diversify_picks_distinct_pool_members(
        lex in ranked_ids(),
        vectors in prop::collection::vec(vector(), 12),
        query in vector(),
        top_k in 0usize..10,
        pool_size in 1usize..10,
        lambda in 0.0f32..=1.0,
    ) {
        let lexical: Vec<LexicalHit> = lex.iter().map(|id| LexicalHit::new(id.clone(), Overlap(1.0))).collect();
        let fused = fuse(&lexical, &[], 60);
        let table: HashMap<String, Vec<f32>> =
            vectors.into_iter().enumerate().map(|(i, v)| (format!("d{i}"), v)).collect();
        let params = MmrParams { top_k, pool_size, lambda };

        let picks = diversify(&fused, &query, |id| table.get(id).map(Vec::as_slice), &params);

        prop_assert_eq!(picks.len(), top_k.min(pool_size).min(fused.len()));
        let head: HashSet<&str> = fused.iter().take(pool_size).map(|h| h.id.as_str()).collect();
        let picked: HashSet<&str> = picks.iter().map(|(id, _)| id.as_str()).collect();
        prop_assert_eq!(picked.len(), picks.len());
        prop_assert!(picked.is_subset(&head));
        prop_assert_eq!(&picks, &diversify(&fused, &query, |id| table.get(id).map(Vec::as_slice), &params));
    }

    #[test]
    fn cache_never_exceeds_capacity_and_keeps_the_newest(
        capacity in 1usize..6,
        keys in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g"]), 1..30),
    ) {
        let cache = QueryCache::new(capacity);
        for (i, key) in keys.iter().enumerate() {
            cache.set(key, i);
            prop_assert!(cache.len() <= capacity);
        }
        let last = keys.len() - 1;
        prop_assert_eq!(cache.get(keys[last]), Some(last));
    }
}
