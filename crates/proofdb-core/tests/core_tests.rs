use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

use proofdb_core::config::{Config, Distance};
use proofdb_core::{Corpus, Error};

#[test]
fn load_assigns_contiguous_row_ids_skipping_blank_lines() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(
        &path,
        concat!(
            "{\"explanation\": \"first\", \"snippet\": \"lemma a\", \"source_file\": \"A.thy\", \"type\": \"lemma\", \"score\": 1.5}\n",
            "\n",
            "   \n",
            "{\"explanation\": \"second\", \"snippet\": \"lemma b\", \"source_file\": \"B.thy\", \"type\": \"lemma\"}\n",
            "{\"explanation\": \"third\"}\n",
        ),
    )
    .unwrap();

    let corpus = Corpus::load(&path).expect("load");
    assert_eq!(corpus.len(), 3);
    let ids: Vec<usize> = corpus.iter().map(|r| r.row_idx).collect();
    assert_eq!(ids, vec![0, 1, 2], "row ids are 0..n-1 in line order");
    assert_eq!(corpus.get(1).unwrap().explanation, "second");
    assert!((corpus.get(0).unwrap().score - 1.5).abs() < 1e-12);
    assert!(corpus.get(1).unwrap().score.abs() < 1e-12, "missing score defaults to 0.0");
    assert_eq!(corpus.get(2).unwrap().source_file, "");
}

#[test]
fn malformed_line_is_fatal_and_reports_physical_line() {
    let src = "{\"explanation\": \"ok\"}\n\nnot json at all\n{\"explanation\": \"never reached\"}\n";
    let err = Corpus::from_reader(Cursor::new(src)).unwrap_err();
    match err {
        Error::Load { line, .. } => assert_eq!(line, 3),
        other => panic!("expected load error, got {other:?}"),
    }
}

#[test]
fn invalid_utf8_line_is_a_load_error() {
    let mut src = b"{\"explanation\": \"ok\"}\n{\"explanation\": \"".to_vec();
    src.extend_from_slice(&[0xff, 0xfe]);
    src.extend_from_slice(b"\"}\r\n");
    let err = Corpus::from_reader(Cursor::new(src)).unwrap_err();
    match err {
        Error::Load { line, .. } => assert_eq!(line, 2),
        other => panic!("expected load error, got {other:?}"),
    }
}

#[test]
fn crlf_line_endings_are_accepted() {
    let corpus = Corpus::from_reader(Cursor::new("{\"explanation\": \"a\"}\r\n\r\n{\"explanation\": \"b\"}\r\n")).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.get(1).unwrap().explanation, "b");
}

#[test]
fn missing_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = Corpus::load(&tmp.path().join("absent.jsonl")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn require_reports_unknown_rows() {
    let corpus = Corpus::from_reader(Cursor::new("{\"explanation\": \"x\"}\n")).unwrap();
    assert!(corpus.require(0).is_ok());
    assert!(matches!(corpus.require(1), Err(Error::NotFound(_))));
}

#[test]
fn config_defaults_and_file_overrides() {
    let tmp = TempDir::new().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    fs::write(
        &cfg_path,
        "[corpus]\npath = \"corpus.jsonl\"\n\n[vector]\ncollection = \"lemmas\"\ndistance = \"l2\"\n\n[fusion]\nfinal_n = 3\n",
    )
    .unwrap();

    let settings = Config::load_from(&cfg_path).unwrap().settings().unwrap();
    assert_eq!(settings.corpus.path, tmp.path().join("corpus.jsonl"));
    assert_eq!(settings.vector.collection, "lemmas");
    assert_eq!(settings.vector.distance, Distance::L2);
    assert_eq!(settings.vector.batch_size, 2048);
    assert_eq!(settings.fusion.final_n, 3);
    assert_eq!(settings.fusion.k_dense, 50);
    assert!((settings.fusion.rrf_c - 60.0).abs() < 1e-12);
    assert_eq!(settings.retrieval.topk, 5);
}

#[test]
fn config_rejects_zero_batch_size() {
    let tmp = TempDir::new().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    fs::write(&cfg_path, "[vector]\nbatch_size = 0\n").unwrap();
    let err = Config::load_from(&cfg_path).unwrap().settings().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn config_get_reads_single_keys() {
    let tmp = TempDir::new().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    fs::write(&cfg_path, "[retrieval]\ntopk = 7\n").unwrap();
    let config = Config::load_from(&cfg_path).unwrap();
    assert_eq!(config.get::<usize>("retrieval.topk").unwrap(), 7);
    assert!(matches!(config.get::<usize>("retrieval.missing"), Err(Error::InvalidConfig(_))));
}
