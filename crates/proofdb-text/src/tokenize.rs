use tantivy::tokenizer::{PreTokenizedString, Token};

use proofdb_core::traits::Tokenizer;

/// Splits on Unicode whitespace. No case folding or stemming, so Isabelle
/// identifiers and operators survive as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Wrap an externally produced token list for Tantivy. Offsets are located
/// left to right in `text`; tokens not found verbatim get an empty span at the
/// current cursor.
pub fn pre_tokenize(text: String, tokens: Vec<String>) -> PreTokenizedString {
    let mut cursor = 0usize;
    let tokens = tokens
        .into_iter()
        .enumerate()
        .map(|(position, token)| {
            let (offset_from, offset_to) = match text[cursor..].find(token.as_str()) {
                Some(rel) => {
                    let from = cursor + rel;
                    (from, from + token.len())
                }
                None => (cursor, cursor),
            };
            cursor = offset_to;
            Token { offset_from, offset_to, position, text: token, position_length: 1 }
        })
        .collect();
    PreTokenizedString { text, tokens }
}
