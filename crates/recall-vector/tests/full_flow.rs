use anyhow::anyhow;

use recall_core::error::Error;
use recall_core::traits::Embedder;
use recall_core::types::Document;
use recall_embed::HashEmbedder;
use recall_vector::{dot, IndexBuilder};

fn clinic_docs() -> Vec<Document> {
    vec![
        Document::new("D1", "Parking is in Lot B", vec![]),
        Document::new("D2", "Parking Lot B is free", vec![]),
        Document::new("D3", "We accept insurance", vec!["billing".into()]),
    ]
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn model_id(&self) -> &str { "broken" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 16 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Err(anyhow!("model offline")) }
}

struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn model_id(&self) -> &str { "short" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 16 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0; 4]).collect())
    }
}

#[test]
fn build_then_search_finds_parking_docs() {
    let embedder = HashEmbedder::new(256);
    let snapshot = IndexBuilder::build(&clinic_docs(), &embedder).expect("build");

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.ids(), &["D1".to_string(), "D2".to_string(), "D3".to_string()]);
    for i in 0..snapshot.len() {
        let row = snapshot.row(i).expect("row");
        assert!((dot(row, row) - 1.0).abs() < 1e-4);
    }

    let q = embedder.embed_batch(&["parking lot".to_string()]).expect("embed").remove(0);
    let hits = snapshot.search(&q, 8).expect("search");
    assert_eq!(hits.len(), 3);
    assert_ne!(hits[0].id, "D3");
    assert_eq!(hits[2].id, "D3");
}

#[test]
fn empty_collection_builds_empty_index() {
    let snapshot = IndexBuilder::build(&[], &BrokenEmbedder).expect("no embedder call for zero docs");
    assert!(snapshot.is_empty());
    assert!(snapshot.search(&[1.0, 0.0, 0.0, 0.0], 8).expect("search").is_empty());
}

#[test]
fn provider_failure_surfaces_as_embedding_unavailable() {
    let err = IndexBuilder::build(&clinic_docs(), &BrokenEmbedder).unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    assert!(err.to_string().contains("model offline"));
}

#[test]
fn short_provider_output_is_rejected() {
    let err = IndexBuilder::build(&clinic_docs(), &ShortEmbedder).unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
}
