use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use proofdb_core::config::VectorSettings;
use proofdb_core::error::Result;
use proofdb_core::traits::Embedder;
use proofdb_core::Corpus;

use crate::dense::{DenseIndex, DenseMetadata};

/// Add every record of `corpus` to the dense index under a fresh id.
/// Rows are appended; re-indexing into the same collection duplicates them.
pub fn index_corpus(dense: &DenseIndex, corpus: &Corpus) -> Result<usize> {
    let ids: Vec<String> = corpus.iter().map(|_| Uuid::new_v4().to_string()).collect();
    let documents: Vec<String> = corpus.iter().map(|r| r.dense_content()).collect();
    let metadatas: Vec<DenseMetadata> = corpus.iter().map(DenseMetadata::from).collect();
    let added = dense.add(&ids, &documents, &metadatas)?;
    info!(docs = added, collection = %dense.settings().collection, path = %dense.settings().path.display(), "indexed corpus");
    Ok(added)
}

/// Load the corpus at `corpus_path` and populate the persistent collection.
pub fn index(corpus_path: &Path, settings: &VectorSettings, embedder: Arc<dyn Embedder>) -> Result<usize> {
    let corpus = Corpus::load(corpus_path)?;
    let dense = DenseIndex::open(settings.clone(), embedder)?;
    index_corpus(&dense, &corpus)
}
