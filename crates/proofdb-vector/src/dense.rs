use anyhow::anyhow;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Float64Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use proofdb_core::config::{Distance, VectorSettings};
use proofdb_core::error::{Error, Result};
use proofdb_core::traits::{DenseSearch, Embedder};
use proofdb_core::types::{Hit, HitMetadata, Record, RetrievalMode, RowIdx};

use crate::schema::build_arrow_schema;
use crate::table::{ensure_table, open_db};

/// Per-row metadata stored next to each vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseMetadata {
    pub row_idx: Option<RowIdx>,
    pub snippet: String,
    pub source_file: String,
    pub kind: String,
    pub score: f64,
}

impl From<&Record> for DenseMetadata {
    fn from(record: &Record) -> Self {
        Self {
            row_idx: Some(record.row_idx),
            snippet: record.snippet.clone(),
            source_file: record.source_file.clone(),
            kind: record.kind.clone(),
            score: record.score,
        }
    }
}

fn distance_type(distance: Distance) -> DistanceType {
    match distance {
        Distance::Cosine => DistanceType::Cosine,
        Distance::L2 => DistanceType::L2,
        Distance::Dot => DistanceType::Dot,
    }
}

/// Maps a raw distance into `(0, 1]`, decreasing in distance.
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// A named LanceDB collection bound to an embedding function.
///
/// The store is async; this type owns a runtime and exposes a blocking API.
/// Concurrency control across processes is left to the store.
pub struct DenseIndex {
    table: Table,
    embedder: Arc<dyn Embedder>,
    settings: VectorSettings,
    dim: i32,
    runtime: Runtime,
}

impl DenseIndex {
    /// Attach to the collection, creating the database directory and the
    /// collection when absent.
    pub fn open(settings: VectorSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dim = i32::try_from(embedder.dim())
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| Error::InvalidArgument(format!("unsupported embedding dimension {}", embedder.dim())))?;
        if embedder.max_len() == 0 {
            return Err(Error::InvalidArgument("embedder accepts no input tokens (max_len 0)".into()));
        }
        if settings.batch_size == 0 {
            return Err(Error::InvalidArgument("batch_size must be positive".into()));
        }
        std::fs::create_dir_all(&settings.path)?;
        let runtime = Runtime::new()?;
        let uri = settings.path.to_string_lossy().to_string();
        let table = runtime.block_on(async {
            let conn = open_db(&uri).await?;
            ensure_table(&conn, &settings.collection, build_arrow_schema(dim)).await
        })?;
        info!(
            path = %settings.path.display(),
            collection = %settings.collection,
            dim,
            max_len = embedder.max_len(),
            "opened dense index"
        );
        Ok(Self { table, embedder, settings, dim, runtime })
    }

    pub fn settings(&self) -> &VectorSettings {
        &self.settings
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.runtime.block_on(self.table.count_rows(None)).map_err(anyhow::Error::from)?)
    }

    /// Embed and insert rows in batches of `batch_size`. The three slices are
    /// parallel. Returns the number of rows written.
    pub fn add(&self, ids: &[String], documents: &[String], metadatas: &[DenseMetadata]) -> Result<usize> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(Error::InvalidArgument(format!(
                "ids ({}), documents ({}) and metadatas ({}) must have equal length",
                ids.len(),
                documents.len(),
                metadatas.len()
            )));
        }
        if ids.is_empty() {
            return Ok(0);
        }

        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")
                .map_err(Error::external)?
                .progress_chars("#>-"),
        );
        let mut inserted = 0usize;
        for start in (0..ids.len()).step_by(self.settings.batch_size) {
            let end = (start + self.settings.batch_size).min(ids.len());
            let vectors = self.embedder.embed_batch(&documents[start..end])?;
            let batch = self.to_record_batch(&ids[start..end], &documents[start..end], &metadatas[start..end], vectors)?;
            self.runtime.block_on(self.insert_batch(batch))?;
            inserted += end - start;
            pb.set_position(inserted as u64);
            debug!(inserted, total = ids.len(), "inserted dense batch");
        }
        pb.finish_with_message("done");
        info!(rows = inserted, collection = %self.settings.collection, "dense insert complete");
        Ok(inserted)
    }

    async fn insert_batch(&self, batch: RecordBatch) -> anyhow::Result<()> {
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        self.table.add(reader).execute().await?;
        Ok(())
    }

    fn to_record_batch(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[DenseMetadata],
        vectors: Vec<Vec<f32>>,
    ) -> Result<RecordBatch> {
        if vectors.len() != ids.len() {
            return Err(Error::External(anyhow!("embedder returned {} vectors for {} documents", vectors.len(), ids.len())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim as usize) {
            return Err(Error::External(anyhow!("embedder returned {} dims, collection expects {}", bad.len(), self.dim)));
        }
        let row_idx: Vec<Option<i64>> = metadatas
            .iter()
            .map(|m| m.row_idx.and_then(|r| i64::try_from(r).ok()))
            .collect();
        let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
        let batch = RecordBatch::try_new(
            build_arrow_schema(self.dim),
            vec![
                Arc::new(StringArray::from(ids.to_vec())),
                Arc::new(Int64Array::from(row_idx)),
                Arc::new(StringArray::from(documents.to_vec())),
                Arc::new(StringArray::from(metadatas.iter().map(|m| m.snippet.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(metadatas.iter().map(|m| m.source_file.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(metadatas.iter().map(|m| m.kind.clone()).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(metadatas.iter().map(|m| m.score).collect::<Vec<_>>())),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim)),
            ],
        )
        .map_err(Error::external)?;
        Ok(batch)
    }

    /// `k` nearest neighbours of `text`, closest first, scored `1/(1+d)`.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<Hit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::External(anyhow!("embedder returned no vector")))?;
        let distance = distance_type(self.settings.distance);
        let batches = self.runtime.block_on(async {
            let stream = self.table.vector_search(query_vec)?.distance_type(distance).limit(k).execute().await?;
            let batches: Vec<RecordBatch> = stream.try_collect().await?;
            Ok::<_, anyhow::Error>(batches)
        })?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(hits_from_batch(batch)?);
        }
        // stable: the store's order survives among equal distances
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        debug!(k, returned = hits.len(), "dense query");
        Ok(hits)
    }
}

impl DenseSearch for DenseIndex {
    fn search_dense(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.query(query, k)
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::External(anyhow!("column '{name}' missing or mistyped in dense results")))
}

fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<Hit>> {
    let ids = column::<StringArray>(batch, "id")?;
    let rows = column::<Int64Array>(batch, "row_idx")?;
    let documents = column::<StringArray>(batch, "document")?;
    let snippets = column::<StringArray>(batch, "snippet")?;
    let sources = column::<StringArray>(batch, "source_file")?;
    let kinds = column::<StringArray>(batch, "type")?;
    let scores = column::<Float64Array>(batch, "score")?;
    let distances = column::<Float32Array>(batch, "_distance")?;

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let row_idx = if rows.is_null(i) { None } else { usize::try_from(rows.value(i)).ok() };
        hits.push(Hit {
            id: ids.value(i).to_string(),
            row_idx,
            document: documents.value(i).to_string(),
            metadata: HitMetadata {
                snippet: snippets.value(i).to_string(),
                source_file: sources.value(i).to_string(),
                kind: kinds.value(i).to_string(),
                score: scores.value(i),
            },
            score: distance_to_score(distances.value(i)),
            mode: RetrievalMode::Dense,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_bounded_and_decreasing() {
        assert!((distance_to_score(0.0) - 1.0).abs() < f32::EPSILON);
        assert!(distance_to_score(0.5) > distance_to_score(1.5));
        assert!(distance_to_score(1e6) > 0.0);
        assert!((distance_to_score(-0.25) - 1.0).abs() < f32::EPSILON, "negative distances clamp to a perfect match");
    }
}
