use std::sync::Arc;

use once_cell::sync::OnceCell;
use tantivy::schema::Value;
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};
use tracing::info;

use proofdb_core::error::{Error, Result};
use proofdb_core::traits::Tokenizer;
use proofdb_core::types::RowIdx;
use proofdb_core::Corpus;

use crate::tantivy_utils::{build_schema, LexicalFields};
use crate::tokenize::{pre_tokenize, WhitespaceTokenizer};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// BM25 model over the lexical content of every record.
///
/// Built once from an immutable corpus; there is no incremental update.
pub struct LexicalIndex {
    pub(crate) corpus: Arc<Corpus>,
    pub(crate) tokenizer: Arc<dyn Tokenizer>,
    pub(crate) searcher: Searcher,
    pub(crate) fields: LexicalFields,
    /// `rows[segment_ord][doc_id]` is the row id of that Tantivy document.
    pub(crate) rows: Vec<Vec<RowIdx>>,
}

impl LexicalIndex {
    pub fn build(corpus: Arc<Corpus>, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter<TantivyDocument> = index.writer_with_num_threads(1, WRITER_HEAP_BYTES).map_err(Error::external)?;
        for record in corpus.iter() {
            let text = record.lexical_content();
            let tokens = tokenizer.tokenize(&text);
            let mut doc = TantivyDocument::new();
            doc.add_u64(fields.row_idx, record.row_idx as u64);
            doc.add_pre_tokenized_text(fields.tokens, pre_tokenize(text, tokens));
            writer.add_document(doc).map_err(Error::external)?;
        }
        writer.commit().map_err(Error::external)?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(Error::external)?;
        let searcher = reader.searcher();
        let rows = Self::row_lookup(&searcher, &fields)?;
        info!(documents = corpus.len(), segments = rows.len(), "built lexical index");
        Ok(Self { corpus, tokenizer, searcher, fields, rows })
    }

    /// Build with the default whitespace tokenizer.
    pub fn with_whitespace(corpus: Arc<Corpus>) -> Result<Self> {
        Self::build(corpus, Arc::new(WhitespaceTokenizer))
    }

    fn row_lookup(searcher: &Searcher, fields: &LexicalFields) -> Result<Vec<Vec<RowIdx>>> {
        let mut rows = Vec::with_capacity(searcher.segment_readers().len());
        for (segment_ord, segment) in searcher.segment_readers().iter().enumerate() {
            let mut segment_rows = Vec::with_capacity(segment.max_doc() as usize);
            for doc_id in 0..segment.max_doc() {
                let doc: TantivyDocument = searcher
                    .doc(DocAddress::new(segment_ord as u32, doc_id))
                    .map_err(Error::external)?;
                let row = doc
                    .get_first(fields.row_idx)
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| Error::NotFound(format!("row id of lexical document {segment_ord}/{doc_id}")))?;
                segment_rows.push(row as RowIdx);
            }
            rows.push(segment_rows);
        }
        Ok(rows)
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }
}

/// Lexical index with an explicit build lifecycle.
///
/// `build` runs at most once even under concurrent first use; later calls and
/// searches reuse the same model. There is no rebuild.
pub struct LazyLexicalIndex {
    corpus: Arc<Corpus>,
    tokenizer: Arc<dyn Tokenizer>,
    cell: OnceCell<LexicalIndex>,
}

impl LazyLexicalIndex {
    pub fn new(corpus: Arc<Corpus>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { corpus, tokenizer, cell: OnceCell::new() }
    }

    pub fn with_whitespace(corpus: Arc<Corpus>) -> Self {
        Self::new(corpus, Arc::new(WhitespaceTokenizer))
    }

    pub fn build(&self) -> Result<&LexicalIndex> {
        self.cell
            .get_or_try_init(|| LexicalIndex::build(Arc::clone(&self.corpus), Arc::clone(&self.tokenizer)))
    }

    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }
}
