//! Exact inner-product index over L2-normalized document embeddings.
//!
//! A snapshot is immutable: `id_list[i]` owns row `i` of the row-major matrix,
//! and the pairing is checked once at construction. Rebuilding produces a new
//! snapshot; nothing here mutates one in place.
use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

use recall_core::error::{Error, Result};
use recall_core::traits::Embedder;
use recall_core::types::{Cosine, Document, DocumentId, SemanticHit};

/// Scale `v` to unit length. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() { *x /= norm; }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    ids: Vec<DocumentId>,
    matrix: Vec<f32>,
    dim: usize,
    positions: HashMap<DocumentId, usize>,
}

impl IndexSnapshot {
    pub fn empty() -> Self { Self::default() }

    /// Assemble a snapshot from parallel ids and rows, normalizing every row.
    pub fn from_parts(ids: Vec<DocumentId>, rows: Vec<Vec<f32>>) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(Error::InvariantViolation(format!("{} ids for {} vector rows", ids.len(), rows.len())));
        }
        let dim = rows.first().map_or(0, Vec::len);
        let mut matrix = Vec::with_capacity(rows.len() * dim);
        for (row_idx, mut row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(Error::InvariantViolation(format!("row {row_idx} has dimension {}, expected {dim}", row.len())));
            }
            l2_normalize(&mut row);
            matrix.extend(row);
        }
        let mut positions = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if positions.insert(id.clone(), row).is_some() {
                return Err(Error::InvariantViolation(format!("document id {id} appears twice")));
            }
        }
        Ok(Self { ids, matrix, dim, positions })
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn dim(&self) -> usize { self.dim }

    pub fn ids(&self) -> &[DocumentId] { &self.ids }

    pub fn position(&self, id: &str) -> Option<usize> { self.positions.get(id).copied() }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.ids.len() { return None; }
        Some(&self.matrix[i * self.dim..(i + 1) * self.dim])
    }

    /// Normalized embedding of document `id`.
    pub fn vector_of(&self, id: &str) -> Option<&[f32]> {
        self.position(id).and_then(|i| self.row(i))
    }

    /// Top `min(top_n, len)` rows by inner product with the normalized query.
    /// An empty snapshot yields an empty list.
    pub fn search(&self, query: &[f32], top_n: usize) -> Result<Vec<SemanticHit>> {
        if self.is_empty() || top_n == 0 { return Ok(Vec::new()); }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let mut q = query.to_vec();
        l2_normalize(&mut q);
        let mut scored: Vec<(usize, Cosine)> = self
            .matrix
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (i, Cosine(dot(row, &q))))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_n.min(self.len()));
        Ok(scored.into_iter().map(|(i, score)| SemanticHit::new(self.ids[i].clone(), score)).collect())
    }
}

/// Sole producer of [`IndexSnapshot`]s.
pub struct IndexBuilder;

impl IndexBuilder {
    /// Full rebuild: one batch encode of every document, in iteration order.
    pub fn build(docs: &[Document], embedder: &dyn Embedder) -> Result<IndexSnapshot> {
        if docs.is_empty() {
            debug!("no documents, publishing empty index");
            return Ok(IndexSnapshot::empty());
        }
        let start = Instant::now();
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let rows = embed_checked(embedder, &texts)?;
        let ids = docs.iter().map(|d| d.id.clone()).collect();
        let snapshot = IndexSnapshot::from_parts(ids, rows)?;
        info!(rows = snapshot.len(), dim = snapshot.dim(), elapsed = ?start.elapsed(), "vector index built");
        Ok(snapshot)
    }
}

/// Call the provider and verify it returned one `dim()`-sized vector per text.
pub fn embed_checked(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let rows = embedder
        .embed_batch(texts)
        .map_err(|e| Error::EmbeddingUnavailable(format!("{}: {e:#}", embedder.model_id())))?;
    if rows.len() != texts.len() {
        return Err(Error::EmbeddingUnavailable(format!("expected {} vectors, provider returned {}", texts.len(), rows.len())));
    }
    let dim = embedder.dim();
    if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
        return Err(Error::EmbeddingUnavailable(format!("expected dimension {dim}, provider returned {}", bad.len())));
    }
    Ok(rows)
}
