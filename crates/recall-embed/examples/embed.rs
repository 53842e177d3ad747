use recall_core::config::EmbeddingConfig;
use recall_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbeddingConfig::default())?;
    let texts = vec!["Parking is in Lot B".to_string(), "We accept insurance".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embedder.dim());
    Ok(())
}
