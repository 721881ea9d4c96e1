use super::*;

/// Running chunk index for a single source. Create one per source.
#[derive(Debug)]
pub struct SourceCounter {
    source_id: String,
    next_index: usize,
}

impl SourceCounter {
    pub fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            next_index: 0,
        }
    }

    pub fn next_record(&mut self, chunk: Chunk) -> Result<ChunkRecord> {
        ensure!(
            chunk.source_id == self.source_id,
            "chunk from {} passed to the counter for {}",
            chunk.source_id,
            self.source_id
        );

        let local_index = self.next_index;
        self.next_index += 1;

        let id = format!(
            "{}:{}:{}",
            self.source_id,
            page_label(chunk.page_start, chunk.page_end),
            local_index
        );

        Ok(ChunkRecord {
            id,
            local_index,
            chunk,
        })
    }
}

pub fn page_label(start: Option<u32>, end: Option<u32>) -> String {
    match (start, end) {
        (Some(start), Some(end)) if start == end => start.to_string(),
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => start.to_string(),
        (None, Some(end)) => end.to_string(),
        (None, None) => "unknown".to_string(),
    }
}
