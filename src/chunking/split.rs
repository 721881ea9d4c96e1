use text_splitter::Characters;

use super::*;

pub const DEFAULT_CHUNK_SIZE: usize = 3000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 400;

pub struct ChunkSplitter {
    splitter: TextSplitter<Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        ensure!(chunk_size > 0, "chunk size must be greater than zero");
        ensure!(
            chunk_overlap < chunk_size,
            "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
        );

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .with_context(|| {
                format!("invalid splitter config: size={chunk_size} overlap={chunk_overlap}")
            })?
            .with_trim(false);

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Windows come back in emission order with their character offset into the
    /// merged text, or `None` when the reported position cannot be mapped.
    pub fn split(&self, document: &MergedDocument) -> Vec<Chunk> {
        let mut cursor = OffsetCursor::default();
        let mut chunks = Vec::<Chunk>::new();

        for (byte_offset, text) in self.splitter.chunk_indices(&document.text) {
            let start_offset = cursor.char_offset(&document.text, byte_offset);
            if start_offset.is_none() {
                warn!(
                    source_id = %document.source_id,
                    byte_offset,
                    "splitter offset is not on a character boundary"
                );
            }
            chunks.push(Chunk::new(&document.source_id, text, start_offset));
        }

        chunks
    }
}

#[derive(Debug, Default)]
struct OffsetCursor {
    byte: usize,
    chars: usize,
}

impl OffsetCursor {
    // Offsets arrive in increasing order, so only the gap since the last call is counted.
    fn char_offset(&mut self, text: &str, byte_offset: usize) -> Option<usize> {
        if byte_offset < self.byte {
            self.byte = 0;
            self.chars = 0;
        }

        let between = text.get(self.byte..byte_offset)?;
        self.chars += between.chars().count();
        self.byte = byte_offset;
        Some(self.chars)
    }
}
