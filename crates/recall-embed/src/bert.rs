use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use recall_core::traits::Embedder;

use crate::device::select_device;
use crate::tokenize::tokenize_batch;

/// Sentence-transformer style BERT encoder (MiniLM and friends) with masked
/// mean pooling and L2 normalization.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl BertEmbedder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` (or
    /// `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;

        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        let mut embedder = Self { model, tokenizer, device, dim: 0, max_len, id: String::new() };
        // Dimension comes from a probe rather than the model config.
        let probe = embedder.encode(&["dimension probe".to_string()])?;
        embedder.dim = probe.first().map(Vec::len).ok_or_else(|| anyhow!("Empty probe embedding"))?;
        embedder.id = format!("bert:{}:d{}", name, embedder.dim);
        info!(model = %embedder.id, "embedding model ready");
        Ok(embedder)
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask.to_dtype(DType::F32)?)?;
        let out = pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 { warn!(batch = texts.len(), ?elapsed, "slow embedding"); } else { debug!(batch = texts.len(), ?elapsed, "embedded batch"); }
        Ok(out)
    }
}

/// Sentence vectors from token states: mean over the tokens `mask` keeps,
/// scaled to unit length.
///
/// `hidden` is `[batch, tokens, width]` and `mask` is `[batch, tokens]`;
/// the result is `[batch, width]`. Rows whose mask is all zero come out as
/// zero vectors rather than NaN.
pub fn masked_mean_l2(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, width) = hidden
        .dims3()
        .map_err(|e| anyhow!("token states must be [batch, tokens, width]: {e}"))?;
    let mask = mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let kept = mask.sum_keepdim(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&kept)?;
    let floor = if hidden.dtype() == DType::F16 { 1e-4 } else { 1e-12 };
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(floor)?;
    let pooled = mean.broadcast_div(&norms)?;
    if pooled.dims() != [batch, width] {
        bail!("pooled shape {:?}, expected [{batch}, {width}]", pooled.dims());
    }
    Ok(pooled)
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin under {}", model_dir.display()))
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { self.encode(texts) }
}
