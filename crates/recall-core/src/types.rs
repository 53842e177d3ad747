//! Domain types shared by the lexical, vector and hybrid crates.
//!
//! Every ranking stage has its own score type. An overlap fraction, a cosine
//! similarity and a fused RRF score are not comparable, so they never share a
//! bare `f32`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type DocumentId = String;

/// A knowledge snippet as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>, tags: Vec<String>) -> Self {
        Self { id: id.into(), text: text.into(), tags }
    }
}

macro_rules! score_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f32);

        impl $name {
            pub fn value(self) -> f32 { self.0 }

            /// Total order, NaN sorts below every number.
            pub fn total_cmp(&self, other: &Self) -> Ordering {
                match (self.0.is_nan(), other.0.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => self.0.total_cmp(&other.0),
                }
            }
        }
    };
}

score_type!(
    /// Fraction of query terms present in a document, in `[0, 1]`.
    Overlap
);
score_type!(
    /// Cosine similarity between two L2-normalized embeddings, in `[-1, 1]`.
    Cosine
);
score_type!(
    /// Accumulated reciprocal-rank-fusion score.
    RrfScore
);

/// Indicates which search branch produced a ranked list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Lexical,
    Semantic,
}

/// One entry of a ranked list produced by a single search branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit<S> {
    pub id: DocumentId,
    pub score: S,
}

impl<S> RankedHit<S> {
    pub fn new(id: impl Into<DocumentId>, score: S) -> Self {
        Self { id: id.into(), score }
    }
}

pub type LexicalHit = RankedHit<Overlap>;
pub type SemanticHit = RankedHit<Cosine>;

/// A document after rank fusion.
///
/// `lexical_rank` / `semantic_rank` are the zero-based positions the document
/// held in each input list, `None` when it was absent from that list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub id: DocumentId,
    pub score: RrfScore,
    pub lexical_rank: Option<usize>,
    pub semantic_rank: Option<usize>,
}

impl FusedHit {
    pub fn sources(&self) -> Vec<SourceKind> {
        let mut out = Vec::with_capacity(2);
        if self.lexical_rank.is_some() { out.push(SourceKind::Lexical); }
        if self.semantic_rank.is_some() { out.push(SourceKind::Semantic); }
        out
    }
}

/// What the retrieval engine hands back to callers.
///
/// `score` is the query–document cosine similarity measured during
/// diversification, not the fused rank score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub text: String,
    pub score: Cosine,
    pub tags: Vec<String>,
}
