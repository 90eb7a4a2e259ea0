use std::fs;
use std::sync::Arc;

use proofdb_core::config::VectorSettings;
use proofdb_core::traits::Embedder;
use proofdb_core::types::{RawRecord, RetrievalMode};
use proofdb_core::{Corpus, Error};
use proofdb_embed::HashEmbedder;
use proofdb_vector::{index, index_corpus, DenseIndex, DenseMetadata};

fn settings(dir: &tempfile::TempDir, batch_size: usize) -> VectorSettings {
    VectorSettings {
        path: dir.path().join("lancedb"),
        collection: "lemmas".to_string(),
        batch_size,
        ..VectorSettings::default()
    }
}

fn corpus() -> Corpus {
    let rec = |explanation: &str, source_file: &str| RawRecord {
        explanation: explanation.to_string(),
        snippet: format!("lemma x: ... ({explanation})"),
        source_file: source_file.to_string(),
        kind: "lemma".to_string(),
        score: 0.25,
    };
    Corpus::from_records(vec![
        rec("structural induction over lists closes the goal", "List.thy"),
        rec("unfold the definition and apply simp", "Set.thy"),
        rec("case split on the boolean then auto", "HOL.thy"),
        rec("rewrite with commutativity of addition", "Nat.thy"),
        rec("contradiction from the assumption", "Logic.thy"),
    ])
}

fn embedder() -> Arc<HashEmbedder> {
    Arc::new(HashEmbedder::new(64))
}

#[test]
fn index_then_query_finds_the_matching_row() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = corpus();
    let dense = DenseIndex::open(settings(&tmp, 2), embedder()).expect("open");
    let added = index_corpus(&dense, &corpus).expect("index");
    assert_eq!(added, 5);
    assert_eq!(dense.count().expect("count"), 5, "batches smaller than the corpus still insert every row");

    let target = corpus.get(2).unwrap();
    let hits = dense.query(&target.dense_content(), 3).expect("query");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].row_idx, Some(2));
    assert_eq!(hits[0].document, target.dense_content());
    assert_eq!(hits[0].metadata.source_file, "HOL.thy");
    assert!((hits[0].metadata.score - 0.25).abs() < 1e-12);
    assert!(hits[0].score > 0.99 && hits[0].score <= 1.0);
    assert!(hits.iter().all(|h| h.mode == RetrievalMode::Dense));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "closest first");
    }
}

#[test]
fn dense_ranking_is_stable_across_calls() {
    let tmp = tempfile::tempdir().unwrap();
    let dense = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("open");
    index_corpus(&dense, &corpus()).expect("index");

    let rank = |q: &str| -> Vec<Option<usize>> { dense.query(q, 5).expect("query").iter().map(|h| h.row_idx).collect() };
    let first = rank("induction over lists");
    for _ in 0..3 {
        assert_eq!(rank("induction over lists"), first);
    }
}

#[test]
fn collection_persists_across_opens() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let dense = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("open");
        index_corpus(&dense, &corpus()).expect("index");
    }
    let reopened = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("reopen");
    assert_eq!(reopened.count().expect("count"), 5);
}

#[test]
fn index_operation_reads_corpus_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(&path, "{\"explanation\": \"by simp\", \"type\": \"lemma\"}\n\n{\"explanation\": \"by auto\"}\n").unwrap();
    let vector = settings(&tmp, 2048);
    let added = index(&path, &vector, embedder()).expect("index");
    assert_eq!(added, 2);

    let dense = DenseIndex::open(vector, embedder()).expect("open");
    let hits = dense.query("[type=] file=\nby auto", 1).expect("query");
    assert_eq!(hits[0].row_idx, Some(1));
}

#[test]
fn rows_without_row_id_surface_as_none() {
    let tmp = tempfile::tempdir().unwrap();
    let dense = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("open");
    let meta = DenseMetadata { row_idx: None, ..DenseMetadata::default() };
    dense
        .add(&["orphan".to_string()], &["an orphan document".to_string()], &[meta])
        .expect("add");
    let hits = dense.query("an orphan document", 5).expect("query");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "orphan");
    assert_eq!(hits[0].row_idx, None);
}

#[test]
fn mismatched_lengths_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let dense = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("open");
    let err = dense
        .add(&["a".to_string(), "b".to_string()], &["doc".to_string()], &[DenseMetadata::default()])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(dense.count().expect("count"), 0);
}

#[test]
fn zero_k_and_oversized_k() {
    let tmp = tempfile::tempdir().unwrap();
    let dense = DenseIndex::open(settings(&tmp, 2048), embedder()).expect("open");
    index_corpus(&dense, &corpus()).expect("index");
    assert!(dense.query("simp", 0).expect("query").is_empty());
    assert_eq!(dense.query("simp", 50).expect("query").len(), 5);
}

struct TruncatingEmbedder;

impl Embedder for TruncatingEmbedder {
    fn dim(&self) -> usize {
        8
    }

    fn max_len(&self) -> usize {
        0
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; 8]).collect())
    }
}

#[test]
fn embedder_without_input_length_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let err = DenseIndex::open(settings(&tmp, 2048), Arc::new(TruncatingEmbedder)).err().expect("rejected");
    assert!(matches!(err, Error::InvalidArgument(_)));
}
