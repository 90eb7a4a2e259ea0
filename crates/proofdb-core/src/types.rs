//! Domain types shared by the lexical, dense and fusion engines.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Zero-based ordinal of a record among the non-blank lines of the corpus.
/// It is the join key between the lexical and dense indices.
pub type RowIdx = usize;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One corpus line as it appears in the JSONL source.
///
/// Missing or `null` fields fall back to empty strings and `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippet: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_file: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

/// A loaded corpus entry. Immutable once the corpus is built.
///
/// - `row_idx`: stable row identity assigned at load time
/// - `explanation`: prose describing the proof
/// - `snippet`: lemma statement and proof script
/// - `source_file`: provenance label
/// - `kind`: free-form category (serialized as `type`)
/// - `score`: auxiliary value carried through from the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub row_idx: RowIdx,
    pub explanation: String,
    pub snippet: String,
    pub source_file: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
}

impl Record {
    pub fn new(row_idx: RowIdx, raw: RawRecord) -> Self {
        Self {
            row_idx,
            explanation: raw.explanation,
            snippet: raw.snippet,
            source_file: raw.source_file,
            kind: raw.kind,
            score: raw.score,
        }
    }

    /// Text embedded into the dense index: category and file prefix, then the explanation.
    pub fn dense_content(&self) -> String {
        format!("[type={}] file={}\n{}", self.kind, self.source_file, self.explanation)
    }

    /// Text tokenized into the lexical index.
    pub fn lexical_content(&self) -> String {
        format!("{} {} {}", self.explanation, self.snippet, self.source_file)
    }

    pub fn metadata(&self) -> HitMetadata {
        HitMetadata {
            snippet: self.snippet.clone(),
            source_file: self.source_file.clone(),
            kind: self.kind.clone(),
            score: self.score,
        }
    }
}

/// Which engine produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Dense,
    Bm25,
}

impl RetrievalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Bm25 => "bm25",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(Self::Dense),
            "bm25" => Ok(Self::Bm25),
            other => Err(Error::InvalidArgument(format!(
                "mode must be 'dense' or 'bm25', got '{other}'"
            ))),
        }
    }
}

/// Fields carried through from the record alongside a hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub snippet: String,
    pub source_file: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// The record's auxiliary score, not a retrieval score.
    pub score: f64,
}

/// The normalized result shape returned by both single-mode engines.
///
/// `score` is engine specific (higher is better) and never comparable across
/// modes. `row_idx` is `None` when the store cannot map a match back to a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub row_idx: Option<RowIdx>,
    pub document: String,
    pub metadata: HitMetadata,
    pub score: f32,
    pub mode: RetrievalMode,
}

/// A hybrid-search result re-hydrated from the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub row_idx: RowIdx,
    pub explanation: String,
    pub snippet: String,
    pub source_file: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// The record's own auxiliary score, echoed for compatibility.
    pub score: f64,
    pub fusion_score: f64,
}

impl FusedHit {
    pub fn from_record(record: &Record, fusion_score: f64) -> Self {
        Self {
            row_idx: record.row_idx,
            explanation: record.explanation.clone(),
            snippet: record.snippet.clone(),
            source_file: record.source_file.clone(),
            kind: record.kind.clone(),
            score: record.score,
            fusion_score,
        }
    }
}

/// Knobs for reciprocal-rank fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    pub k_dense: usize,
    pub k_sparse: usize,
    pub rrf_c: f64,
    pub final_n: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self { k_dense: 50, k_sparse: 50, rrf_c: 60.0, final_n: 10 }
    }
}
