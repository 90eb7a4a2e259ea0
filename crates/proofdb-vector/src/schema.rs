use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Collection layout: one row per corpus record. `row_idx` is nullable so rows
/// written by other tools without a row id still load.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("row_idx", DataType::Int64, true),
		Field::new("document", DataType::Utf8, false),
		Field::new("snippet", DataType::Utf8, false),
		Field::new("source_file", DataType::Utf8, false),
		Field::new("type", DataType::Utf8, false),
		Field::new("score", DataType::Float64, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
