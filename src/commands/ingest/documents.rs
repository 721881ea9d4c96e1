use super::*;

#[derive(Debug, Default)]
pub(super) struct PreparedRun {
    pub page_record_count: usize,
    pub documents: Vec<DocumentSummary>,
    pub records: Vec<ChunkRecord>,
    pub warnings: Vec<String>,
}

impl PreparedRun {
    pub fn failed_documents(&self) -> usize {
        self.documents
            .iter()
            .filter(|document| document.failure.is_some())
            .count()
    }
}

/// Loads every document under `data_dir` and turns each source into chunk
/// records. A document that fails to load or chunk is recorded and skipped.
pub(super) fn prepare_run(
    source: &dyn PageSource,
    data_dir: &Path,
    splitter: &ChunkSplitter,
    policy: UnanchoredPolicy,
    namer: &NamespaceNamer,
) -> Result<PreparedRun> {
    let mut prepared = PreparedRun::default();
    let mut pages = Vec::<PageRecord>::new();

    let document_paths = source
        .list_documents(data_dir)
        .with_context(|| format!("failed to list documents in {}", data_dir.display()))?;
    if document_paths.is_empty() {
        warn!(data_dir = %data_dir.display(), "no documents found");
        prepared
            .warnings
            .push(format!("no documents found in {}", data_dir.display()));
    }

    for path in document_paths {
        match source.load_document(&path) {
            Ok(records) => {
                info!(path = %path.display(), pages = records.len(), "loaded document pages");
                pages.extend(records);
            }
            Err(load_error) => {
                let source_id = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                warn!(
                    path = %path.display(),
                    error = %format!("{load_error:#}"),
                    "skipping document that failed to load"
                );
                prepared.documents.push(DocumentSummary {
                    namespace: namer.namespace_for(&source_id),
                    source_id,
                    failure: Some(format!("{load_error:#}")),
                    ..DocumentSummary::default()
                });
            }
        }
    }

    prepared.page_record_count = pages.len();

    for (source_id, source_pages) in group_by_source(pages) {
        let mut summary = DocumentSummary {
            namespace: namer.namespace_for(&source_id),
            source_id: source_id.clone(),
            page_count: source_pages.len(),
            empty_page_count: source_pages
                .iter()
                .filter(|page| page.text.is_empty())
                .count(),
            ..DocumentSummary::default()
        };

        match chunk_source(&source_id, source_pages, splitter, policy, &mut summary) {
            Ok(records) => {
                info!(
                    source_id = %source_id,
                    pages = summary.page_count,
                    chunks = summary.chunk_count,
                    unlabeled = summary.unlabeled_chunk_count,
                    "document chunked"
                );
                if summary.chunk_count == 0 {
                    prepared
                        .warnings
                        .push(format!("{source_id} produced no chunks"));
                }
                if summary.unanchored_chunk_count > 0 {
                    prepared.warnings.push(format!(
                        "{source_id}: {} chunk(s) had no offset and were attributed with policy {}",
                        summary.unanchored_chunk_count,
                        policy.as_str()
                    ));
                }
                prepared.records.extend(records);
            }
            Err(chunk_error) => {
                warn!(
                    source_id = %source_id,
                    error = %format!("{chunk_error:#}"),
                    "skipping document that failed to chunk"
                );
                summary.failure = Some(format!("{chunk_error:#}"));
            }
        }

        prepared.documents.push(summary);
    }

    prepared
        .documents
        .sort_by(|left, right| left.source_id.cmp(&right.source_id));

    Ok(prepared)
}

fn chunk_source(
    source_id: &str,
    pages: Vec<PageRecord>,
    splitter: &ChunkSplitter,
    policy: UnanchoredPolicy,
    summary: &mut DocumentSummary,
) -> Result<Vec<ChunkRecord>> {
    let document = merge_pages(source_id, pages)?;
    summary.merged_chars = document.char_len;

    let prepared = prepare_document(&document, splitter, policy)?;
    summary.chunk_count = prepared.records.len();
    summary.unlabeled_chunk_count = prepared.unlabeled_chunk_count;
    summary.unanchored_chunk_count = prepared.unanchored_chunk_count;

    Ok(prepared.records)
}
