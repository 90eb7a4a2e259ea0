//! Reciprocal rank fusion over the dense and lexical candidate lists.
use std::collections::{BTreeSet, HashMap};

use proofdb_core::types::RowIdx;

/// Rank substituted for a side that did not return the row.
pub const SENTINEL_RANK: usize = 1_000_000_000;

/// A fused candidate with the ranks that produced its score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub row_idx: RowIdx,
    pub score: f64,
    pub dense_rank: Option<usize>,
    pub sparse_rank: Option<usize>,
}

/// Row to zero-based position in `rows`. Entries without a row still occupy
/// their position but are not mapped.
pub fn rank_map(rows: &[Option<RowIdx>]) -> HashMap<RowIdx, usize> {
    let mut ranks = HashMap::with_capacity(rows.len());
    for (rank, row) in rows.iter().enumerate() {
        if let Some(row) = row {
            // first (best) position wins on duplicates, unlike a last-write map
            ranks.entry(*row).or_insert(rank);
        }
    }
    ranks
}

fn rrf_term(rank: usize, c: f64) -> f64 {
    1.0 / (rank as f64 + 1.0 + c)
}

/// Fuse two ranked row lists. Every row present in either list is a
/// candidate, scored `1/(rd+1+c) + 1/(rs+1+c)` with [`SENTINEL_RANK`] for
/// the missing side. Output is sorted by descending score, then ascending row.
pub fn reciprocal_rank_fusion(dense_rows: &[Option<RowIdx>], sparse_rows: &[Option<RowIdx>], c: f64) -> Vec<FusedCandidate> {
    let dense = rank_map(dense_rows);
    let sparse = rank_map(sparse_rows);
    let candidates: BTreeSet<RowIdx> = dense.keys().chain(sparse.keys()).copied().collect();

    let mut fused: Vec<FusedCandidate> = candidates
        .into_iter()
        .map(|row_idx| {
            let dense_rank = dense.get(&row_idx).copied();
            let sparse_rank = sparse.get(&row_idx).copied();
            let score = rrf_term(dense_rank.unwrap_or(SENTINEL_RANK), c) + rrf_term(sparse_rank.unwrap_or(SENTINEL_RANK), c);
            FusedCandidate { row_idx, score, dense_rank, sparse_rank }
        })
        .collect();
    fused.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row_idx.cmp(&b.row_idx)));
    fused
}
