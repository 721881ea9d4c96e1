use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};

use crate::cli::{IngestArgs, SourceKind};
use crate::model::PageRecord;

mod ocr_json;
mod pdftotext;

pub use ocr_json::OcrJsonSource;
pub use pdftotext::PdfTextSource;

/// Yields page records from a data directory, one document at a time so a
/// broken file can be skipped without losing the others.
pub trait PageSource {
    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn load_document(&self, path: &Path) -> Result<Vec<PageRecord>>;
}

pub fn build_page_source(args: &IngestArgs) -> Box<dyn PageSource> {
    match args.source {
        SourceKind::Pdf => Box::new(PdfTextSource::new(args.max_pages_per_doc)),
        SourceKind::OcrJson => Box::new(OcrJsonSource),
    }
}

pub fn validate_page_record(record: &PageRecord, origin: &Path) -> Result<()> {
    ensure!(
        !record.source_id.trim().is_empty(),
        "page record from {} has an empty source id",
        origin.display()
    );
    ensure!(
        record.page_number >= 1,
        "page record from {} has page number 0 (pages are 1-based)",
        origin.display()
    );
    Ok(())
}

pub(crate) fn file_name_string(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("path has no file name: {}", path.display()))
}

pub(crate) fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if keep(&path) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests;
