use proofdb_core::config::EmbeddingSettings;
use proofdb_core::traits::Embedder;
use proofdb_embed::{get_default_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, fake_dim: 128, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["by induction on xs".to_string(), "by induction on xs".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(embedder.dim(), 128);
    assert_eq!(v1.len(), 128);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_are_closer() {
    let e = HashEmbedder::new(256);
    let q = e.embed_text("induction on lists");
    let near = e.embed_text("structural induction on lists");
    let far = e.embed_text("case analysis with auto");
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn empty_text_is_zero_vector() {
    let e = HashEmbedder::new(16);
    assert!(e.embed_text("").iter().all(|x| *x == 0.0));
}
