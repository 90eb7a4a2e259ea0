use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::Term;
use tracing::debug;

use proofdb_core::error::{Error, Result};
use proofdb_core::traits::LexicalSearch;
use proofdb_core::types::{Hit, RetrievalMode, RowIdx};

use crate::index::{LazyLexicalIndex, LexicalIndex};

impl LexicalIndex {
    /// One `Should` term clause per query token, so repeated tokens count once
    /// per occurrence. The query text is never parsed as query syntax.
    fn build_query(&self, query: &str) -> Option<BooleanQuery> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = self
            .tokenizer
            .tokenize(query)
            .into_iter()
            .map(|token| {
                let term = Term::from_field_text(self.fields.tokens, &token);
                let clause: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, clause)
            })
            .collect();
        if clauses.is_empty() { None } else { Some(BooleanQuery::new(clauses)) }
    }

    /// BM25 score of every record, indexed by row id. Records sharing no
    /// token with the query score `0.0`.
    pub fn score_all(&self, query: &str) -> Result<Vec<f32>> {
        let mut scores = vec![0.0f32; self.len()];
        if self.is_empty() {
            return Ok(scores);
        }
        let Some(q) = self.build_query(query) else { return Ok(scores) };
        let top_docs = self
            .searcher
            .search(&q, &TopDocs::with_limit(self.len()))
            .map_err(Error::external)?;
        for (score, addr) in top_docs {
            let row = self
                .rows
                .get(addr.segment_ord as usize)
                .and_then(|seg| seg.get(addr.doc_id as usize))
                .copied()
                .ok_or_else(|| Error::NotFound(format!("lexical document {addr:?}")))?;
            scores[row] = score;
        }
        Ok(scores)
    }

    /// Best `k` rows by descending score; equal scores are ordered by
    /// ascending row id. Rows scoring zero are not returned.
    pub fn top_k(&self, query: &str, k: usize) -> Result<Vec<(RowIdx, f32)>> {
        let mut ranked: Vec<(RowIdx, f32)> = self
            .score_all(query)?
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        debug!(k, returned = ranked.len(), "lexical top-k");
        Ok(ranked)
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.top_k(query, k)?
            .into_iter()
            .map(|(row, score)| {
                let record = self.corpus.require(row)?;
                Ok(Hit {
                    id: format!("row-{row}"),
                    row_idx: Some(row),
                    document: record.dense_content(),
                    metadata: record.metadata(),
                    score,
                    mode: RetrievalMode::Bm25,
                })
            })
            .collect()
    }
}

impl LexicalSearch for LexicalIndex {
    fn search_lexical(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.search(query, k)
    }
}

impl LexicalSearch for LazyLexicalIndex {
    fn search_lexical(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.build()?.search(query, k)
    }
}
