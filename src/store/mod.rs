use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::cli::{StoreArgs, StoreKind};
use crate::model::VectorRecord;

mod pinecone;
mod sqlite;

pub use pinecone::PineconeStore;
pub use sqlite::SqliteVectorStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("namespace not found: {0}")]
    NotFound(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API error: {0}")]
    Api(String),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Namespaced vector index. `upsert` overwrites records with the same id.
pub trait VectorStore {
    fn upsert(&mut self, namespace: &str, records: &[VectorRecord]) -> Result<(), StoreError>;

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;

    fn delete_all(&mut self, namespace: &str) -> Result<(), StoreError>;

    fn count(&self, namespace: &str) -> Result<usize, StoreError>;
}

pub fn open_store(args: &StoreArgs) -> Result<Box<dyn VectorStore>> {
    match args.store {
        StoreKind::Sqlite => Ok(Box::new(SqliteVectorStore::open(&args.db_path)?)),
        StoreKind::Pinecone => {
            let api_key = args
                .pinecone_api_key
                .clone()
                .context("PINECONE_API_KEY is required for --store pinecone")?;
            let index_host = args
                .pinecone_index_host
                .clone()
                .context("PINECONE_INDEX_HOST is required for --store pinecone")?;
            let store =
                PineconeStore::new(&api_key, &index_host, Duration::from_secs(args.timeout_secs))?;
            Ok(Box::new(store))
        }
    }
}
