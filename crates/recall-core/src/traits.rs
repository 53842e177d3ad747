/// Text to vector function backing semantic search.
///
/// Implementations must be deterministic for a fixed `model_id`. Callers
/// L2-normalize the returned vectors; implementations may already do so.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model and its version.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector of length `dim()` per input text, in input order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
