use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail, ensure};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::warn;

use crate::cli::UnanchoredPolicy;
use crate::model::{Chunk, ChunkRecord, MergedDocument, PageRecord, PageSpan};

mod attribute;
mod identity;
mod merge;
mod split;

pub use attribute::attribute_chunk;
pub use identity::SourceCounter;
pub use merge::{group_by_source, merge_pages};
pub use split::{ChunkSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

#[derive(Debug, Default)]
pub struct PreparedDocument {
    pub records: Vec<ChunkRecord>,
    pub unlabeled_chunk_count: usize,
    pub unanchored_chunk_count: usize,
}

/// Runs split, attribution and identity assignment for one merged document.
pub fn prepare_document(
    document: &MergedDocument,
    splitter: &ChunkSplitter,
    policy: UnanchoredPolicy,
) -> Result<PreparedDocument> {
    let mut counter = SourceCounter::new(&document.source_id);
    let mut prepared = PreparedDocument::default();

    for chunk in splitter.split(document) {
        if chunk.start_offset.is_none() {
            prepared.unanchored_chunk_count += 1;
        }
        let attributed = attribute_chunk(chunk, document, policy)?;
        if attributed.pages.is_empty() {
            prepared.unlabeled_chunk_count += 1;
        }
        prepared.records.push(counter.next_record(attributed)?);
    }

    Ok(prepared)
}
