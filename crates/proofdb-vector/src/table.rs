//! LanceDB connection and housekeeping helpers.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection, Table};
use std::sync::Arc;
use tracing::info;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Open `name`, creating it empty with `schema` when absent.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<Table> {
    if !table_exists(conn, name).await? {
        info!(table = name, "creating collection");
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
        // another process may have created it in the meantime
        match conn.create_table(name, Box::new(iter)).execute().await {
            Ok(_) | Err(lancedb::Error::TableAlreadyExists { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(conn.open_table(name).execute().await?)
}
