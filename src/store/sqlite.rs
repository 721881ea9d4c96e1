use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::{StoreError, VectorStore};
use crate::model::VectorRecord;
use crate::util::{ensure_directory, now_utc_string, sha256_hex};

pub struct SqliteVectorStore {
    connection: Connection,
}

impl SqliteVectorStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .context("failed to set synchronous=NORMAL")?;

        Self::with_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS vectors (
                  namespace TEXT NOT NULL,
                  id TEXT NOT NULL,
                  embedding BLOB NOT NULL,
                  embedding_dim INTEGER NOT NULL,
                  metadata_json TEXT NOT NULL,
                  text_hash TEXT NOT NULL,
                  updated_at TEXT NOT NULL,
                  PRIMARY KEY(namespace, id)
                );

                CREATE INDEX IF NOT EXISTS idx_vectors_namespace ON vectors(namespace);
                ",
            )
            .context("failed to create vector store schema")?;

        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn fetch(&self, namespace: &str, id: &str) -> Result<Option<VectorRecord>> {
        use rusqlite::OptionalExtension;

        use crate::model::VectorMetadata;

        let row = self
            .connection
            .query_row(
                "SELECT embedding, embedding_dim, metadata_json FROM vectors WHERE namespace = ?1 AND id = ?2",
                params![namespace, id],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((blob, dimensions, metadata_json)) = row else {
            return Ok(None);
        };

        let embedding = decode_embedding_blob(&blob, dimensions as usize)
            .with_context(|| format!("corrupt embedding blob for {namespace}/{id}"))?;
        let metadata: VectorMetadata = serde_json::from_str(&metadata_json)?;

        Ok(Some(VectorRecord {
            id: id.to_string(),
            embedding,
            metadata,
        }))
    }
}

impl VectorStore for SqliteVectorStore {
    fn upsert(&mut self, namespace: &str, records: &[VectorRecord]) -> Result<(), StoreError> {
        let tx = self.connection.transaction()?;
        {
            let mut statement = tx.prepare(
                "
                INSERT INTO vectors(namespace, id, embedding, embedding_dim, metadata_json, text_hash, updated_at)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(namespace, id) DO UPDATE SET
                  embedding=excluded.embedding,
                  embedding_dim=excluded.embedding_dim,
                  metadata_json=excluded.metadata_json,
                  text_hash=excluded.text_hash,
                  updated_at=excluded.updated_at
                ",
            )?;

            let updated_at = now_utc_string();
            for record in records {
                let metadata_json = serde_json::to_string(&record.metadata)?;
                statement.execute(params![
                    namespace,
                    record.id,
                    encode_embedding_blob(&record.embedding),
                    record.embedding.len() as i64,
                    metadata_json,
                    sha256_hex(&record.metadata.text),
                    updated_at,
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT DISTINCT namespace FROM vectors ORDER BY namespace ASC")?;
        let namespaces = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()?;
        Ok(namespaces)
    }

    fn delete_all(&mut self, namespace: &str) -> Result<(), StoreError> {
        let deleted = self
            .connection
            .execute("DELETE FROM vectors WHERE namespace = ?1", params![namespace])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(namespace.to_string()));
        }
        Ok(())
    }

    fn count(&self, namespace: &str) -> Result<usize, StoreError> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM vectors WHERE namespace = ?1",
            params![namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn encode_embedding_blob(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

#[cfg(test)]
fn decode_embedding_blob(blob: &[u8], expected_dim: usize) -> Option<Vec<f32>> {
    if blob.len() != expected_dim.saturating_mul(4) {
        return None;
    }

    Some(
        blob.chunks_exact(4)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect(),
    )
}
