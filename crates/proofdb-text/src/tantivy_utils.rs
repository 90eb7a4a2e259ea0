use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED};

pub const ROW_FIELD: &str = "row_idx";
pub const TOKENS_FIELD: &str = "tokens";

pub struct LexicalFields {
    pub row_idx: Field,
    pub tokens: Field,
}

/// Two fields: the stored row id and the token field BM25 scores against.
/// The token field only ever receives pre-tokenized values, so the "raw"
/// tokenizer registered on it is never applied to document text.
pub fn build_schema() -> (Schema, LexicalFields) {
    let mut schema_builder = Schema::builder();
    let row_idx = schema_builder.add_u64_field(ROW_FIELD, STORED);
    let indexing = TextFieldIndexing::default()
        .set_tokenizer("raw")
        .set_index_option(IndexRecordOption::WithFreqs);
    let tokens = schema_builder.add_text_field(TOKENS_FIELD, TextOptions::default().set_indexing_options(indexing));
    (schema_builder.build(), LexicalFields { row_idx, tokens })
}
