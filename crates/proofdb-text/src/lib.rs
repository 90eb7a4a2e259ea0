//! proofdb-text
//!
//! BM25 lexical index over the corpus, backed by an in-RAM Tantivy index fed
//! with pre-tokenized text so any `Tokenizer` can be plugged in.
pub mod index;
pub mod search;
pub mod tantivy_utils;
pub mod tokenize;

pub use index::{LazyLexicalIndex, LexicalIndex};
pub use tokenize::WhitespaceTokenizer;
