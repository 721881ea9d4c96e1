use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

use super::{PageSource, file_name_string, sorted_entries, validate_page_record};
use crate::model::PageRecord;

/// Reads the text layer of every `*.pdf` in a directory with poppler's `pdftotext`.
pub struct PdfTextSource {
    max_pages_per_doc: Option<usize>,
}

impl PdfTextSource {
    pub fn new(max_pages_per_doc: Option<usize>) -> Self {
        Self { max_pages_per_doc }
    }
}

impl PageSource for PdfTextSource {
    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        sorted_entries(dir, |path| path.is_file() && is_pdf(path))
    }

    fn load_document(&self, path: &Path) -> Result<Vec<PageRecord>> {
        let source_id = file_name_string(path)?;
        let pages = extract_pages_with_pdftotext(path, self.max_pages_per_doc)?;

        let records = pages
            .into_iter()
            .enumerate()
            .map(|(index, text)| PageRecord {
                source_id: source_id.clone(),
                page_number: (index + 1) as u32,
                text,
            })
            .collect::<Vec<_>>();

        for record in &records {
            validate_page_record(record, path)?;
        }
        Ok(records)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

fn extract_pages_with_pdftotext(
    pdf_path: &Path,
    max_pages_per_doc: Option<usize>,
) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages_per_doc {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_form_feed_pages(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

// pdftotext ends every page with a form feed, so the tail is usually blank.
pub(super) fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|page| page.replace('\u{0000}', "").trim().to_string())
        .collect();

    while pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }

    pages
}
