use crate::error::Result;
use crate::types::Hit;

/// An external sentence-embedding function.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Splits text into the token sequence the lexical model ranks over.
/// The same tokenizer must be used for documents and queries.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Nearest-neighbour search by embedding similarity.
pub trait DenseSearch: Send + Sync {
    fn search_dense(&self, query: &str, k: usize) -> Result<Vec<Hit>>;
}

/// BM25 search over the tokenized corpus.
pub trait LexicalSearch: Send + Sync {
    fn search_lexical(&self, query: &str, k: usize) -> Result<Vec<Hit>>;
}
