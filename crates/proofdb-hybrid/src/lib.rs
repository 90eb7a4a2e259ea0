//! proofdb-hybrid
//!
//! The query surface: single-mode `retrieve` and reciprocal-rank-fused
//! `search_hybrid` over the dense and lexical indices.
use std::sync::Arc;

use tracing::{debug, info};

use proofdb_core::config::Settings;
use proofdb_core::error::{Error, Result};
use proofdb_core::traits::{DenseSearch, LexicalSearch};
use proofdb_core::types::{FusedHit, FusionParams, Hit, RetrievalMode, RowIdx};
use proofdb_core::Corpus;
use proofdb_embed::get_default_embedder;
use proofdb_text::LazyLexicalIndex;
use proofdb_vector::DenseIndex;

pub mod fusion;
pub mod retrieval;

pub use fusion::{reciprocal_rank_fusion, FusedCandidate, SENTINEL_RANK};
pub use retrieval::Retriever;

pub struct HybridSearchEngine<D, L>
where
    D: DenseSearch,
    L: LexicalSearch,
{
    retriever: Retriever<D, L>,
    corpus: Arc<Corpus>,
}

impl<D, L> HybridSearchEngine<D, L>
where
    D: DenseSearch,
    L: LexicalSearch,
{
    /// `corpus` must be the one both indices were built from; fused rows are
    /// re-hydrated from it.
    pub fn new(dense: D, lexical: L, corpus: Arc<Corpus>) -> Self {
        Self { retriever: Retriever::new(dense, lexical), corpus }
    }

    pub fn retriever(&self) -> &Retriever<D, L> {
        &self.retriever
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn retrieve(&self, query: &str, topk: usize, mode: &str) -> Result<Vec<Hit>> {
        self.retriever.retrieve(query, topk, mode)
    }

    /// One dense query and one lexical pass, fused with RRF and cut to
    /// `final_n`. Dense hits that carry no row id cannot be joined; they are
    /// not candidates but still count toward the ranks of later hits.
    pub fn search_hybrid(&self, query: &str, params: &FusionParams) -> Result<Vec<FusedHit>> {
        if params.rrf_c.is_nan() || params.rrf_c < 0.0 {
            return Err(Error::InvalidArgument(format!("rrf_c must be a non-negative number, got {}", params.rrf_c)));
        }
        let dense_rows: Vec<Option<RowIdx>> = self
            .retriever
            .retrieve_mode(query, params.k_dense, RetrievalMode::Dense)?
            .iter()
            .map(|h| h.row_idx)
            .collect();
        let sparse_rows: Vec<Option<RowIdx>> = self
            .retriever
            .retrieve_mode(query, params.k_sparse, RetrievalMode::Bm25)?
            .iter()
            .map(|h| h.row_idx)
            .collect();

        let fused = reciprocal_rank_fusion(&dense_rows, &sparse_rows, params.rrf_c);
        debug!(dense = dense_rows.len(), sparse = sparse_rows.len(), candidates = fused.len(), "fused");
        fused
            .into_iter()
            .take(params.final_n)
            .map(|c| Ok(FusedHit::from_record(self.corpus.require(c.row_idx)?, c.score)))
            .collect()
    }
}

/// The engine over the persistent LanceDB collection and the BM25 index.
pub type DefaultEngine = HybridSearchEngine<DenseIndex, LazyLexicalIndex>;

impl HybridSearchEngine<DenseIndex, LazyLexicalIndex> {
    /// Load the corpus, attach to the dense collection and build the lexical
    /// model up front.
    pub fn open(settings: &Settings) -> Result<Self> {
        let corpus = Arc::new(Corpus::load(&settings.corpus.path)?);
        let embedder = get_default_embedder(&settings.embedding)?;
        let dense = DenseIndex::open(settings.vector.clone(), embedder)?;
        let lexical = LazyLexicalIndex::with_whitespace(Arc::clone(&corpus));
        lexical.build()?;
        info!(records = corpus.len(), "hybrid engine ready");
        Ok(Self::new(dense, lexical, corpus))
    }
}

/// Populate the configured dense collection from the configured corpus.
pub fn index(settings: &Settings) -> Result<usize> {
    let embedder = get_default_embedder(&settings.embedding)?;
    proofdb_vector::index(&settings.corpus.path, &settings.vector, embedder)
}
