//! The retrieval facade: document mutation, index rebuilds and the query path.
//!
//! Queries run against one published [`IndexState`], so the lexical scorer,
//! the vector index and the result texts always describe the same document
//! set. Mutations update the store and then rebuild a fresh state off to the
//! side; readers keep whatever state they loaded until they finish.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use recall_core::config::RetrievalConfig;
use recall_core::error::{Error, Result};
use recall_core::store::DocumentStore;
use recall_core::text::normalize_query;
use recall_core::traits::Embedder;
use recall_core::types::{Cosine, Document, FusedHit, SearchResult};
use recall_text::LexicalIndex;
use recall_vector::{embed_checked, IndexBuilder, IndexSnapshot, SnapshotCell};

use crate::cache::QueryCache;
use crate::diversity::{diversify, MmrParams};
use crate::fusion::fuse;

/// Everything a query reads, built together from one store version.
#[derive(Debug, Default)]
pub struct IndexState {
    version: u64,
    documents: Vec<Document>,
    lexical: LexicalIndex,
    vectors: IndexSnapshot,
}

impl IndexState {
    fn new(version: u64, documents: Vec<Document>, vectors: IndexSnapshot) -> Result<Self> {
        if documents.len() != vectors.len() {
            return Err(Error::InvariantViolation(format!(
                "{} documents but {} vector rows",
                documents.len(),
                vectors.len()
            )));
        }
        let lexical = LexicalIndex::build(&documents);
        Ok(Self { version, documents, lexical, vectors })
    }

    /// Store version this state was built from.
    pub fn version(&self) -> u64 { self.version }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn vectors(&self) -> &IndexSnapshot { &self.vectors }

    pub fn lexical(&self) -> &LexicalIndex { &self.lexical }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.vectors.position(id).map(|row| &self.documents[row])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub is_new: bool,
    pub total_docs: usize,
}

#[derive(Clone)]
struct CachedResults {
    version: u64,
    top_k: usize,
    results: Vec<SearchResult>,
}

impl CachedResults {
    /// A list computed for `self.top_k` answers any smaller request by prefix
    /// (MMR selection is greedy), and any larger one once the candidates ran out.
    fn covers(&self, top_k: usize) -> bool {
        top_k <= self.top_k || self.results.len() < self.top_k
    }
}

enum QueryVector {
    Ready(Vec<f32>),
    /// Nothing indexed, so nothing to embed against.
    NoIndex,
    Failed(Error),
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
    store: RwLock<DocumentStore>,
    state: SnapshotCell<IndexState>,
    cache: QueryCache<CachedResults>,
    build_lock: tokio::sync::Mutex<()>,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn Embedder>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        info!(model = embedder.model_id(), dim = embedder.dim(), "retrieval engine ready");
        Ok(Self {
            cache: QueryCache::new(config.cache_capacity),
            embedder,
            config,
            store: RwLock::new(DocumentStore::new()),
            state: SnapshotCell::default(),
            build_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    fn store_read(&self) -> RwLockReadGuard<'_, DocumentStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, DocumentStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace one document and rebuild the indexes.
    ///
    /// The store keeps the change even if the rebuild fails; the previous index
    /// state stays published and the next successful rebuild picks it up.
    pub async fn upsert(&self, id: &str, text: &str, tags: Vec<String>) -> Result<UpsertOutcome> {
        let outcome = {
            let mut store = self.store_write();
            let is_new = store.upsert(id, text, tags);
            UpsertOutcome { is_new, total_docs: store.len() }
        };
        debug!(id, is_new = outcome.is_new, total = outcome.total_docs, "document upserted");
        self.rebuild().await?;
        Ok(outcome)
    }

    /// Upsert a batch with a single rebuild. Returns how many ids were new.
    pub async fn upsert_many(&self, docs: Vec<Document>) -> Result<usize> {
        let added = {
            let mut store = self.store_write();
            docs.into_iter().filter(|d| store.upsert(d.id.clone(), d.text.clone(), d.tags.clone())).count()
        };
        self.rebuild().await?;
        Ok(added)
    }

    /// Remove every document.
    pub async fn clear(&self) -> Result<()> {
        self.store_write().clear();
        self.rebuild().await
    }

    /// Documents currently in the store, in store order.
    pub fn documents(&self) -> Vec<Document> {
        self.store_read().get_all().to_vec()
    }

    pub fn len(&self) -> usize { self.store_read().len() }

    pub fn is_empty(&self) -> bool { self.store_read().is_empty() }

    /// The index state queries currently run against.
    pub fn snapshot(&self) -> Arc<IndexState> { self.state.load() }

    pub fn cache_len(&self) -> usize { self.cache.len() }

    /// Bring the published state up to the store's version.
    ///
    /// Rebuilds are serialized; a caller that finds the state already current
    /// (because a concurrent rebuild covered its change) returns immediately.
    pub async fn rebuild(&self) -> Result<()> {
        let _guard = self.build_lock.lock().await;
        let (version, docs) = {
            let store = self.store_read();
            (store.version(), store.get_all().to_vec())
        };
        if self.state.load().version() >= version {
            debug!(version, "index state already current");
            return Ok(());
        }

        let start = Instant::now();
        let embedder = Arc::clone(&self.embedder);
        let built = tokio::task::spawn_blocking(move || {
            IndexBuilder::build(&docs, embedder.as_ref()).map(|vectors| (docs, vectors))
        })
        .await
        .map_err(|e| Error::Operation(format!("index build task failed: {e}")))?;
        let (docs, vectors) = match built {
            Ok(parts) => parts,
            Err(e) => {
                warn!(version, error = %e, "rebuild failed, previous index stays published");
                return Err(e);
            }
        };

        let state = IndexState::new(version, docs, vectors)?;
        let rows = state.documents().len();
        self.state.publish(state);
        if self.config.invalidate_cache_on_mutation && !self.cache.is_empty() {
            self.cache.clear();
            info!(version, "query cache cleared");
        }
        info!(version, rows, elapsed = ?start.elapsed(), "index state published");
        Ok(())
    }

    /// [`RetrievalEngine::retrieve`] with the configured default `top_k`.
    pub async fn retrieve_default(&self, query: &str) -> Vec<SearchResult> {
        self.retrieve(query, self.config.default_top_k).await
    }

    /// Hybrid search: lexical and semantic candidates fused by rank, then
    /// diversified with MMR. Never fails; if the query cannot be embedded the
    /// lexical candidates are returned in fused order with a zero score, and
    /// that degraded answer is not cached.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let state = self.state.load();
        let key = normalize_query(query);

        if top_k == 0 {
            return Vec::new();
        }

        if let Some(hit) = self.cache.get(&key) {
            let current = !self.config.invalidate_cache_on_mutation || hit.version == state.version();
            if current && hit.covers(top_k) {
                debug!(query = %key, top_k, cached_top_k = hit.top_k, "cache hit");
                return hit.results.into_iter().take(top_k).collect();
            }
        }

        let start = Instant::now();
        let lexical = state.lexical().search(&key, self.config.lexical_top_n);
        let lexical_at = start.elapsed();

        let query_vector = self.embed_query(query, &state).await;
        let embed_at = start.elapsed();

        let (semantic, query_vector) = match query_vector {
            QueryVector::Ready(q) => match state.vectors().search(&q, self.config.semantic_top_n) {
                Ok(hits) => (hits, QueryVector::Ready(q)),
                Err(e) => (Vec::new(), QueryVector::Failed(e)),
            },
            other => (Vec::new(), other),
        };
        let semantic_at = start.elapsed();

        let fused = fuse(&lexical, &semantic, self.config.rrf_k);
        let fused_at = start.elapsed();
        debug!(
            lexical = lexical.len(),
            semantic = semantic.len(),
            fused = fused.len(),
            lexical_ms = ms(lexical_at),
            embed_ms = ms(embed_at - lexical_at),
            semantic_ms = ms(semantic_at - embed_at),
            fusion_ms = ms(fused_at - semantic_at),
            "candidates gathered"
        );

        let results = match query_vector {
            QueryVector::Ready(q) => {
                let params = MmrParams { top_k, pool_size: self.config.mmr_pool_size, lambda: self.config.mmr_lambda };
                let picks = diversify(&fused, &q, |id| state.vectors().vector_of(id), &params);
                let results = materialize(&state, picks);
                self.cache.set(&key, CachedResults { version: state.version(), top_k, results: results.clone() });
                results
            }
            QueryVector::NoIndex => {
                let results = lexical_only(&state, &fused, top_k);
                self.cache.set(&key, CachedResults { version: state.version(), top_k, results: results.clone() });
                results
            }
            QueryVector::Failed(e) => {
                if e.is_embedding_failure() {
                    warn!(error = %e, query = %key, "query embedding unavailable, answering from lexical candidates");
                } else {
                    warn!(error = %e, query = %key, "semantic search failed, answering from lexical candidates");
                }
                lexical_only(&state, &fused, top_k)
            }
        };
        debug!(
            results = results.len(),
            mmr_ms = ms(start.elapsed() - fused_at),
            total_ms = ms(start.elapsed()),
            "retrieve finished"
        );
        results
    }

    async fn embed_query(&self, query: &str, state: &IndexState) -> QueryVector {
        if state.vectors().is_empty() {
            return QueryVector::NoIndex;
        }
        let embedder = Arc::clone(&self.embedder);
        let texts = vec![query.to_string()];
        let task = tokio::task::spawn_blocking(move || embed_checked(embedder.as_ref(), &texts));
        let timeout = self.config.embed_timeout();
        let rows = match tokio::time::timeout(timeout, task).await {
            Err(_) => return QueryVector::Failed(Error::EmbeddingTimeout(timeout)),
            Ok(Err(join)) => return QueryVector::Failed(Error::Operation(format!("query embedding task failed: {join}"))),
            Ok(Ok(Err(e))) => return QueryVector::Failed(e),
            Ok(Ok(Ok(rows))) => rows,
        };
        match rows.into_iter().next() {
            Some(v) => QueryVector::Ready(v),
            None => QueryVector::Failed(Error::EmbeddingUnavailable("provider returned no query vector".into())),
        }
    }
}

fn ms(d: Duration) -> f64 { d.as_secs_f64() * 1e3 }

fn materialize(state: &IndexState, picks: Vec<(String, Cosine)>) -> Vec<SearchResult> {
    picks
        .into_iter()
        .filter_map(|(id, score)| {
            state.document(&id).map(|doc| SearchResult {
                id,
                text: doc.text.clone(),
                score,
                tags: doc.tags.clone(),
            })
        })
        .collect()
}

fn lexical_only(state: &IndexState, fused: &[FusedHit], top_k: usize) -> Vec<SearchResult> {
    let picks = fused.iter().take(top_k).map(|h| (h.id.clone(), Cosine(0.0))).collect();
    materialize(state, picks)
}
