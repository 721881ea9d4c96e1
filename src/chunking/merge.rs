use super::*;

pub const PAGE_SEPARATOR: char = '\n';

pub fn group_by_source(records: Vec<PageRecord>) -> BTreeMap<String, Vec<PageRecord>> {
    let mut grouped = BTreeMap::<String, Vec<PageRecord>>::new();
    for record in records {
        grouped
            .entry(record.source_id.clone())
            .or_default()
            .push(record);
    }
    grouped
}

/// Concatenates one source's pages in page order, one separator between pages.
///
/// Separator characters are owned by no span, and an empty page keeps a
/// zero-length span at the cursor.
pub fn merge_pages(source_id: &str, mut pages: Vec<PageRecord>) -> Result<MergedDocument> {
    pages.sort_by_key(|page| page.page_number);

    let mut seen = BTreeSet::<u32>::new();
    for page in &pages {
        ensure!(
            page.source_id == source_id,
            "page {} belongs to {} but was merged into {}",
            page.page_number,
            page.source_id,
            source_id
        );
        if !seen.insert(page.page_number) {
            bail!("duplicate page {} in {}", page.page_number, source_id);
        }
    }

    let mut text = String::with_capacity(pages.iter().map(|page| page.text.len() + 1).sum());
    let mut page_spans = Vec::<PageSpan>::with_capacity(pages.len());
    let mut cursor = 0usize;

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            text.push(PAGE_SEPARATOR);
            cursor += 1;
        }

        let start_offset = cursor;
        text.push_str(&page.text);
        cursor += page.text.chars().count();

        page_spans.push(PageSpan {
            start_offset,
            end_offset: cursor,
            page_number: page.page_number,
        });
    }

    Ok(MergedDocument {
        source_id: source_id.to_string(),
        text,
        page_spans,
        char_len: cursor,
    })
}
