//! recall-embed
//!
//! Embedding providers behind `recall_core::traits::Embedder`: a candle BERT
//! sentence encoder for real use and a feature-hashing embedder for tests and
//! offline development (`APP_USE_FAKE_EMBEDDINGS=1`).
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use recall_core::config::{expand_path, EmbeddingConfig};
use recall_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod hash;
pub mod tokenize;

pub use bert::{masked_mean_l2, BertEmbedder};
pub use hash::HashEmbedder;

const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if config.use_fake || fake_requested_by_env() {
        info!(dim = config.fake_dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(config.fake_dim)));
    }
    let model_dir = resolve_model_dir(config)?;
    Ok(Arc::new(BertEmbedder::load(&model_dir, config.max_len)?))
}

fn resolve_model_dir(config: &EmbeddingConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.model_dir {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("embedding.model_dir {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { info!(var, dir = %p.display(), "model dir from environment"); return Ok(p); }
        }
    }
    for candidate in [Path::new("models").join(DEFAULT_MODEL), Path::new("../models").join(DEFAULT_MODEL)] {
        if candidate.exists() { return Ok(candidate); }
    }
    Err(anyhow!("Could not locate {} model directory; set embedding.model_dir or APP_MODEL_DIR", DEFAULT_MODEL))
}
