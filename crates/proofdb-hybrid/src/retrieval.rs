use tracing::debug;

use proofdb_core::error::Result;
use proofdb_core::traits::{DenseSearch, LexicalSearch};
use proofdb_core::types::{Hit, RetrievalMode};

/// Single-mode retrieval: dispatches a query to the dense or lexical index.
/// No fusion happens here.
pub struct Retriever<D, L>
where
    D: DenseSearch,
    L: LexicalSearch,
{
    dense: D,
    lexical: L,
}

impl<D, L> Retriever<D, L>
where
    D: DenseSearch,
    L: LexicalSearch,
{
    pub fn new(dense: D, lexical: L) -> Self {
        Self { dense, lexical }
    }

    pub fn dense(&self) -> &D {
        &self.dense
    }

    pub fn lexical(&self) -> &L {
        &self.lexical
    }

    /// `mode` must be `"dense"` or `"bm25"`; anything else is an
    /// invalid-argument error and no index is queried.
    pub fn retrieve(&self, query: &str, topk: usize, mode: &str) -> Result<Vec<Hit>> {
        let mode: RetrievalMode = mode.parse()?;
        self.retrieve_mode(query, topk, mode)
    }

    pub fn retrieve_mode(&self, query: &str, topk: usize, mode: RetrievalMode) -> Result<Vec<Hit>> {
        let hits = match mode {
            RetrievalMode::Dense => self.dense.search_dense(query, topk)?,
            RetrievalMode::Bm25 => self.lexical.search_lexical(query, topk)?,
        };
        debug!(%mode, topk, returned = hits.len(), "retrieve");
        Ok(hits)
    }
}
