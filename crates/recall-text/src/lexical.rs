//! Pure term-overlap scoring.
//!
//! score = |query_terms ∩ doc_terms| / max(|query_terms|, 1)
//!
//! Terms are whitespace-separated tokens; documents are lower-cased before
//! tokenizing, the query is expected to be normalized already. No IDF.
use std::collections::HashSet;

use recall_core::text::term_set;
use recall_core::types::{Document, DocumentId, LexicalHit, Overlap};

/// Per-document term sets, computed once per rebuild and kept in store order.
#[derive(Debug, Default, Clone)]
pub struct LexicalIndex {
    entries: Vec<(DocumentId, HashSet<String>)>,
}

impl LexicalIndex {
    pub fn build(docs: &[Document]) -> Self {
        let entries = docs
            .iter()
            .map(|d| {
                let lowered = d.text.to_lowercase();
                let terms = term_set(&lowered).into_iter().map(str::to_string).collect();
                (d.id.clone(), terms)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Score every document against `normalized_query`, longest overlap first.
    /// Ties keep store order. Returns at most `top_n` hits.
    pub fn search(&self, normalized_query: &str, top_n: usize) -> Vec<LexicalHit> {
        let query_terms = term_set(normalized_query);
        let denom = query_terms.len().max(1) as f32;
        let mut scored: Vec<LexicalHit> = self
            .entries
            .iter()
            .map(|(id, terms)| {
                let overlap = query_terms.iter().filter(|t| terms.contains(**t)).count();
                LexicalHit::new(id.clone(), Overlap(overlap as f32 / denom))
            })
            .collect();
        // sort_by is stable, so equal scores stay in store order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_n);
        scored
    }
}
