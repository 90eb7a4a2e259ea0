//! JSONL corpus loader.
//!
//! Each non-blank line is one JSON object. Rows are numbered in order among
//! the non-blank lines, and that number is the record's identity in every
//! index built from the corpus.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{RawRecord, Record, RowIdx};

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let corpus = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), records = corpus.len(), "loaded corpus");
        Ok(corpus)
    }

    /// Parse every non-blank line. A line that fails to parse, including one
    /// that is not valid UTF-8, aborts the load.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for (line_no, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            let raw: RawRecord = serde_json::from_slice(line)
                .map_err(|source| Error::Load { line: line_no + 1, source })?;
            records.push(Record::new(records.len(), raw));
        }
        debug!(records = records.len(), "parsed corpus lines");
        Ok(Self { records })
    }

    pub fn from_records(raws: Vec<RawRecord>) -> Self {
        let records = raws
            .into_iter()
            .enumerate()
            .map(|(row_idx, raw)| Record::new(row_idx, raw))
            .collect();
        Self { records }
    }

    pub fn get(&self, row_idx: RowIdx) -> Option<&Record> {
        self.records.get(row_idx)
    }

    /// Like [`Corpus::get`] but a missing row is an error.
    pub fn require(&self, row_idx: RowIdx) -> Result<&Record> {
        self.get(row_idx)
            .ok_or_else(|| Error::NotFound(format!("row {row_idx} (corpus has {} rows)", self.len())))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
