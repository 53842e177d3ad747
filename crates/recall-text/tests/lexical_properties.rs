use proptest::prelude::*;

use recall_core::text::normalize_query;
use recall_core::types::Document;
use recall_text::LexicalIndex;

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["parking", "lot", "b", "insurance", "cash", "late", "fee", "Parking", "LOT"])
        .prop_map(str::to_string)
}

fn doc_texts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::collection::vec(word(), 0..6).prop_map(|w| w.join(" ")), 0..12)
}

proptest! {
    #[test]
    fn hits_are_bounded_sorted_and_fractional(texts in doc_texts(), query in prop::collection::vec(word(), 0..4), top_n in 0usize..10) {
        let docs: Vec<Document> = texts.iter().enumerate().map(|(i, t)| Document::new(format!("d{i}"), t.clone(), vec![])).collect();
        let index = LexicalIndex::build(&docs);
        let hits = index.search(&normalize_query(&query.join(" ")), top_n);

        prop_assert!(hits.len() <= top_n.min(docs.len()));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score.value() >= pair[1].score.value());
        }
        for h in &hits {
            prop_assert!((0.0..=1.0).contains(&h.score.value()));
        }
    }
}
