//! proofdb-embed
//!
//! The embedding function consumed by the dense index: a candle BERT sentence
//! encoder, or a deterministic hashing embedder when
//! `APP_USE_FAKE_EMBEDDINGS=1` / `embedding.use_fake = true`.
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use proofdb_core::config::EmbeddingSettings;
use proofdb_core::traits::Embedder;

pub mod device;
pub mod hashing;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hashing::HashEmbedder;
pub use model::SentenceEmbedder;
pub use pool::masked_mean_l2;

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_requested(settings) {
        info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Arc::new(SentenceEmbedder::load(&model_dir, settings.max_len)?))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = settings.model_dir.as_ref().filter(|p| p.exists()) {
        return Ok(dir.clone());
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                info!(var, dir = %p.display(), "model dir from environment");
                return Ok(p);
            }
        }
    }
    let fallback = PathBuf::from("models/all-MiniLM-L6-v2");
    if fallback.exists() {
        return Ok(fallback);
    }
    Err(anyhow!("Could not locate a sentence embedding model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
