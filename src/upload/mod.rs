use anyhow::{Context, Result, ensure};
use regex::Regex;
use tracing::{error, info};

use crate::embedding::EmbeddingService;
use crate::model::{BatchProgress, ChunkRecord, NamespaceReport, VectorMetadata, VectorRecord};
use crate::store::{StoreError, VectorStore};

pub const DEFAULT_BATCH_SIZE: usize = 15;

const UNKNOWN_NAMESPACE: &str = "unknown";

/// Maps source ids to store namespaces: basename without `.pdf`, whitespace
/// collapsed to `_`, lowercased, restricted to `[a-z0-9_.-]`.
pub struct NamespaceNamer {
    whitespace: Regex,
    disallowed: Regex,
}

impl NamespaceNamer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            disallowed: Regex::new(r"[^a-z0-9_.\-]")
                .context("failed to compile namespace character regex")?,
        })
    }

    pub fn namespace_for(&self, source_id: &str) -> String {
        let base = source_id
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(source_id)
            .trim();
        let collapsed = self
            .whitespace
            .replace_all(strip_pdf_suffix(base).trim(), "_")
            .to_lowercase();
        let namespace = self.disallowed.replace_all(&collapsed, "_").into_owned();

        if namespace.is_empty() {
            UNKNOWN_NAMESPACE.to_string()
        } else {
            namespace
        }
    }

    /// Groups records per namespace, keeping record order and first-seen namespace order.
    pub fn group_by_namespace(&self, records: Vec<ChunkRecord>) -> Vec<(String, Vec<ChunkRecord>)> {
        let mut groups: Vec<(String, Vec<ChunkRecord>)> = Vec::new();
        for record in records {
            let namespace = self.namespace_for(&record.chunk.source_id);
            match groups.iter_mut().find(|(existing, _)| *existing == namespace) {
                Some((_, members)) => members.push(record),
                None => groups.push((namespace, vec![record])),
            }
        }
        groups
    }
}

fn strip_pdf_suffix(name: &str) -> &str {
    let Some(cut) = name.len().checked_sub(4) else {
        return name;
    };
    match (name.get(..cut), name.get(cut..)) {
        (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(".pdf") => stem,
        _ => name,
    }
}

pub struct UploadBatcher<'a> {
    embedder: &'a dyn EmbeddingService,
    store: &'a mut dyn VectorStore,
    batch_size: usize,
}

impl<'a> UploadBatcher<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingService,
        store: &'a mut dyn VectorStore,
        batch_size: usize,
    ) -> Result<Self> {
        ensure!(batch_size > 0, "batch size must be at least 1");
        Ok(Self {
            embedder,
            store,
            batch_size,
        })
    }

    /// Embeds and upserts `records` batch by batch. The first failure stops
    /// the namespace and is stored in the report's `failure`.
    pub fn upload_namespace(&mut self, namespace: &str, records: &[ChunkRecord]) -> NamespaceReport {
        let mut report = NamespaceReport {
            namespace: namespace.to_string(),
            total: records.len(),
            ..NamespaceReport::default()
        };

        if let Err(upload_error) = self.upload_batches(namespace, records, &mut report) {
            error!(
                namespace,
                uploaded = report.uploaded,
                total = report.total,
                error = %format!("{upload_error:#}"),
                "namespace upload failed"
            );
            report.failure = Some(format!("{upload_error:#}"));
        }

        report
    }

    pub fn upload_all(&mut self, groups: &[(String, Vec<ChunkRecord>)]) -> Vec<NamespaceReport> {
        groups
            .iter()
            .map(|(namespace, records)| self.upload_namespace(namespace, records))
            .collect()
    }

    fn upload_batches(
        &mut self,
        namespace: &str,
        records: &[ChunkRecord],
        report: &mut NamespaceReport,
    ) -> Result<()> {
        for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
            let vectors = batch
                .iter()
                .map(|record| self.vector_record(record))
                .collect::<Result<Vec<_>>>()?;

            self.store.upsert(namespace, &vectors).with_context(|| {
                format!("failed to upsert batch {batch_index} into namespace {namespace}")
            })?;

            report.uploaded += batch.len();
            report.batches.push(BatchProgress {
                batch_index,
                batch_size: batch.len(),
                uploaded: report.uploaded,
                total: report.total,
            });
            info!(
                namespace,
                batch = batch_index,
                uploaded = report.uploaded,
                total = report.total,
                "batch upserted"
            );
        }

        Ok(())
    }

    fn vector_record(&self, record: &ChunkRecord) -> Result<VectorRecord> {
        let embedding = self
            .embedder
            .embed(&record.chunk.text)
            .with_context(|| format!("failed to embed chunk {}", record.id))?;
        ensure!(
            !embedding.is_empty(),
            "embedder {} returned an empty vector for chunk {}",
            self.embedder.model_id(),
            record.id
        );

        Ok(VectorRecord {
            id: record.id.clone(),
            embedding,
            metadata: VectorMetadata::from_record(record),
        })
    }
}

/// Deletes every namespace in the store. Namespaces the store reports as
/// missing count as already empty. Returns the namespaces actually cleared.
pub fn reset_store(store: &mut dyn VectorStore) -> Result<Vec<String>> {
    let namespaces = store
        .list_namespaces()
        .context("failed to list namespaces for reset")?;

    let mut cleared = Vec::with_capacity(namespaces.len());
    for namespace in namespaces {
        match store.delete_all(&namespace) {
            Ok(()) => {
                info!(namespace = %namespace, "namespace cleared");
                cleared.push(namespace);
            }
            Err(StoreError::NotFound(_)) => {
                info!(namespace = %namespace, "namespace already empty");
            }
            Err(delete_error) => {
                return Err(delete_error)
                    .with_context(|| format!("failed to clear namespace {namespace}"));
            }
        }
    }

    Ok(cleared)
}
