use super::*;

pub(super) const MANIFEST_VERSION: u32 = 1;

pub(super) fn config_snapshot(args: &IngestArgs, splitter: &ChunkSplitter) -> RunConfigSnapshot {
    RunConfigSnapshot {
        data_dir: args.data_dir.display().to_string(),
        source: args.source.as_str().to_string(),
        chunk_size: splitter.chunk_size(),
        chunk_overlap: splitter.chunk_overlap(),
        batch_size: args.batch_size,
        reset: args.reset,
        dry_run: args.dry_run,
        unanchored_policy: args.unanchored_policy.as_str().to_string(),
        embedder: args.embedder.as_str().to_string(),
        store: args.store.store.as_str().to_string(),
    }
}

pub(super) fn chunk_previews(records: &[ChunkRecord]) -> Vec<ChunkPreview> {
    records
        .iter()
        .map(|record| ChunkPreview {
            id: record.id.clone(),
            local_index: record.local_index,
            start_offset: record.chunk.start_offset,
            char_len: record.chunk.char_len(),
            pages: record
                .chunk
                .pages
                .iter()
                .map(|page| page.to_string())
                .collect(),
        })
        .collect()
}

pub(super) fn run_status(dry_run: bool, failures: usize) -> &'static str {
    match (dry_run, failures) {
        (true, 0) => "dry_run",
        (true, _) => "dry_run_with_failures",
        (false, 0) => "completed",
        (false, _) => "completed_with_failures",
    }
}
