use super::*;

/// Fills `pages`, `page_start` and `page_end` from the document's page spans.
///
/// Known offsets use the half-open overlap test against every non-empty span.
/// Chunks without an offset follow `policy`.
pub fn attribute_chunk(
    mut chunk: Chunk,
    document: &MergedDocument,
    policy: UnanchoredPolicy,
) -> Result<Chunk> {
    ensure!(
        chunk.source_id == document.source_id,
        "chunk from {} attributed against {}",
        chunk.source_id,
        document.source_id
    );

    chunk.pages = match chunk.start_offset {
        Some(start_offset) => {
            let end_offset = start_offset + chunk.char_len();
            overlapping_pages(&document.page_spans, start_offset, end_offset)
        }
        None => match policy {
            UnanchoredPolicy::AllPages => {
                warn!(
                    source_id = %document.source_id,
                    pages = document.page_spans.len(),
                    "chunk offset unknown, attributing to every page"
                );
                document.page_numbers()
            }
            UnanchoredPolicy::NoPages => {
                warn!(
                    source_id = %document.source_id,
                    "chunk offset unknown, leaving chunk unlabeled"
                );
                BTreeSet::new()
            }
            UnanchoredPolicy::Reject => {
                bail!(
                    "chunk offset unknown in {} and unanchored policy is reject",
                    document.source_id
                )
            }
        },
    };

    chunk.page_start = chunk.pages.first().copied();
    chunk.page_end = chunk.pages.last().copied();
    Ok(chunk)
}

fn overlapping_pages(spans: &[PageSpan], start_offset: usize, end_offset: usize) -> BTreeSet<u32> {
    spans
        .iter()
        .filter(|span| !span.is_empty())
        .filter(|span| !(end_offset <= span.start_offset || start_offset >= span.end_offset))
        .map(|span| span.page_number)
        .collect()
}
