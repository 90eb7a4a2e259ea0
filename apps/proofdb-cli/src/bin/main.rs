use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use proofdb_core::config::{Config, Settings};
use proofdb_hybrid::DefaultEngine;

#[derive(Parser)]
#[command(name = "proofdb")]
#[command(about = "Dense, BM25 and hybrid retrieval over a proof corpus")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed the corpus into the vector store
    Index {
        /// Corpus JSONL, overrides `corpus.path`
        #[arg(long)]
        jsonl: Option<PathBuf>,
    },

    /// Single-mode retrieval
    Retrieve {
        /// Query text, required unless --test-jsonl is given
        query: Option<String>,

        #[arg(long, default_value = "dense", value_parser = ["dense", "bm25"])]
        mode: String,

        /// Number of hits, overrides `retrieval.topk`
        #[arg(long)]
        topk: Option<usize>,

        /// Batch of `{input, gt}` lines to run instead of QUERY
        #[arg(long)]
        test_jsonl: Option<PathBuf>,

        /// Write results here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Hybrid retrieval fused with reciprocal rank fusion
    Search {
        query: Option<String>,

        #[arg(long)]
        final_n: Option<usize>,

        #[arg(long)]
        k_dense: Option<usize>,

        #[arg(long)]
        k_sparse: Option<usize>,

        #[arg(long)]
        rrf_c: Option<f64>,

        #[arg(long)]
        test_jsonl: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, PartialEq)]
struct TestCase {
    input: String,
    gt: Option<Value>,
}

#[derive(Serialize)]
struct CaseResult<H: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    case: Option<usize>,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gt: Option<Value>,
    hits: Vec<H>,
}

/// Blank lines and lines without a non-empty `input` are skipped.
fn read_test_cases<R: BufRead>(reader: R) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut value: Value = serde_json::from_str(line).with_context(|| format!("test case line {}", i + 1))?;
        let input = match value.get("input").and_then(Value::as_str) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => continue,
        };
        let gt = value.get_mut("gt").map(Value::take).filter(|v| !v.is_null());
        cases.push(TestCase { input, gt });
    }
    Ok(cases)
}

/// Run `run` over either the test batch or the single query.
fn run_queries<H, F>(query: Option<String>, test_jsonl: Option<&Path>, mut run: F) -> Result<Vec<CaseResult<H>>>
where
    H: Serialize,
    F: FnMut(&str) -> Result<Vec<H>>,
{
    if let Some(path) = test_jsonl {
        let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let cases = read_test_cases(BufReader::new(file))?;
        info!(cases = cases.len(), path = %path.display(), "running test batch");
        return cases
            .into_iter()
            .enumerate()
            .map(|(i, tc)| {
                let hits = run(&tc.input)?;
                Ok(CaseResult { case: Some(i + 1), input: tc.input, gt: tc.gt, hits })
            })
            .collect();
    }
    match query {
        Some(q) => {
            let hits = run(&q)?;
            Ok(vec![CaseResult { case: None, input: q, gt: None, hits }])
        }
        None => bail!("a QUERY is required unless --test-jsonl is given"),
    }
}

fn emit<T: Serialize>(results: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "saved results");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: &Path) -> Result<Settings> {
    Ok(Config::load_from(path)?.settings()?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut settings = load_settings(&cli.config)?;

    match cli.command {
        Commands::Index { jsonl } => {
            if let Some(path) = jsonl {
                settings.corpus.path = path;
            }
            let added = proofdb_hybrid::index(&settings)?;
            info!(docs = added, corpus = %settings.corpus.path.display(), "index complete");
        }
        Commands::Retrieve { query, mode, topk, test_jsonl, out } => {
            let topk = topk.unwrap_or(settings.retrieval.topk);
            if query.is_none() && test_jsonl.is_none() {
                bail!("a QUERY is required unless --test-jsonl is given");
            }
            let engine = DefaultEngine::open(&settings)?;
            let results = run_queries(query, test_jsonl.as_deref(), |q| Ok(engine.retrieve(q, topk, &mode)?))?;
            emit(&results, out.as_deref())?;
        }
        Commands::Search { query, final_n, k_dense, k_sparse, rrf_c, test_jsonl, out } => {
            let mut params = settings.fusion;
            params.final_n = final_n.unwrap_or(params.final_n);
            params.k_dense = k_dense.unwrap_or(params.k_dense);
            params.k_sparse = k_sparse.unwrap_or(params.k_sparse);
            params.rrf_c = rrf_c.unwrap_or(params.rrf_c);
            if query.is_none() && test_jsonl.is_none() {
                bail!("a QUERY is required unless --test-jsonl is given");
            }
            let engine = DefaultEngine::open(&settings)?;
            let results = run_queries(query, test_jsonl.as_deref(), |q| Ok(engine.search_hybrid(q, &params)?))?;
            emit(&results, out.as_deref())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_overrides() {
        let cli = Cli::try_parse_from(["proofdb", "-vv", "search", "by simp", "--final-n", "3", "--rrf-c", "10"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, final_n, rrf_c, k_dense, .. } => {
                assert_eq!(query.as_deref(), Some("by simp"));
                assert_eq!(final_n, Some(3));
                assert_eq!(rrf_c, Some(10.0));
                assert_eq!(k_dense, None);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["proofdb", "retrieve", "q", "--mode", "fuzzy"]).is_err());
    }

    #[test]
    fn test_cases_skip_blank_and_inputless_lines() {
        let data = "{\"input\": \"lemma a\", \"gt\": \"by simp\"}\n\n{\"gt\": \"orphan\"}\n{\"input\": \"\"}\n{\"input\": \"lemma b\"}\n";
        let cases = read_test_cases(data.as_bytes()).unwrap();
        assert_eq!(
            cases,
            vec![
                TestCase { input: "lemma a".into(), gt: Some(Value::String("by simp".into())) },
                TestCase { input: "lemma b".into(), gt: None },
            ]
        );
    }

    #[test]
    fn malformed_test_case_reports_line() {
        let err = read_test_cases("{\"input\": \"a\"}\nnot json\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn batch_results_are_numbered_from_one() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cases.jsonl");
        fs::write(&path, "{\"input\": \"x\", \"gt\": 1}\n{\"input\": \"y\"}\n").unwrap();
        let results = run_queries(None, Some(&path), |q| Ok(vec![q.len()])).unwrap();
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json[0]["case"], 1);
        assert_eq!(json[0]["gt"], 1);
        assert_eq!(json[1]["case"], 2);
        assert!(json[1].get("gt").is_none());
    }

    #[test]
    fn single_query_has_no_case_number() {
        let results = run_queries(Some("q".into()), None, |_| Ok(Vec::<u8>::new())).unwrap();
        let json = serde_json::to_value(&results).unwrap();
        assert!(json[0].get("case").is_none());
        assert_eq!(json[0]["input"], "q");
    }

    #[test]
    fn missing_query_is_an_error() {
        assert!(run_queries::<u8, _>(None, None, |_| Ok(vec![])).is_err());
    }

    #[test]
    fn settings_load_with_defaults_when_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = load_settings(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings.fusion.final_n, 10);
        assert_eq!(settings.retrieval.topk, 5);
    }
}
