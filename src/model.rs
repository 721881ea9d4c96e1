use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub source_id: String,
    pub page_number: u32,
    pub text: String,
}

/// Half-open `[start_offset, end_offset)` range of a merged document owned by one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpan {
    pub start_offset: usize,
    pub end_offset: usize,
    pub page_number: u32,
}

impl PageSpan {
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub source_id: String,
    pub text: String,
    pub page_spans: Vec<PageSpan>,
    pub char_len: usize,
}

impl MergedDocument {
    pub fn page_numbers(&self) -> BTreeSet<u32> {
        self.page_spans.iter().map(|span| span.page_number).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source_id: String,
    pub text: String,
    pub start_offset: Option<usize>,
    pub pages: BTreeSet<u32>,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
}

impl Chunk {
    pub fn new(source_id: &str, text: &str, start_offset: Option<usize>) -> Self {
        Self {
            source_id: source_id.to_string(),
            text: text.to_string(),
            start_offset,
            pages: BTreeSet::new(),
            page_start: None,
            page_end: None,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub id: String,
    pub local_index: usize,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub text: String,
    pub source_id: String,
    pub pages: Vec<String>,
    pub local_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_end: Option<u32>,
}

impl VectorMetadata {
    pub fn from_record(record: &ChunkRecord) -> Self {
        Self {
            text: record.chunk.text.clone(),
            source_id: record.chunk.source_id.clone(),
            pages: record
                .chunk
                .pages
                .iter()
                .map(|page| page.to_string())
                .collect(),
            local_index: record.local_index,
            page_start: record.chunk.page_start,
            page_end: record.chunk.page_end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: VectorMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunConfigSnapshot {
    pub data_dir: String,
    pub source: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub reset: bool,
    pub dry_run: bool,
    pub unanchored_policy: String,
    pub embedder: String,
    pub store: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentSummary {
    pub source_id: String,
    pub namespace: String,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub merged_chars: usize,
    pub chunk_count: usize,
    pub unlabeled_chunk_count: usize,
    pub unanchored_chunk_count: usize,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub batch_size: usize,
    pub uploaded: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceReport {
    pub namespace: String,
    pub total: usize,
    pub uploaded: usize,
    pub batches: Vec<BatchProgress>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub id: String,
    pub local_index: usize,
    pub start_offset: Option<usize>,
    pub char_len: usize,
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub config: RunConfigSnapshot,
    pub page_record_count: usize,
    pub documents: Vec<DocumentSummary>,
    pub namespaces: Vec<NamespaceReport>,
    pub cleared_namespaces: Vec<String>,
    pub total_uploaded: usize,
    pub chunks: Vec<ChunkPreview>,
    pub warnings: Vec<String>,
    pub failure: Option<String>,
}
