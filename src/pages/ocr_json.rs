use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{PageSource, file_name_string, sorted_entries, validate_page_record};
use crate::model::PageRecord;

/// Reads Cloud Vision asynchronous OCR output laid out as
/// `<dir>/<document>/*.json`, one sub-directory per source document.
pub struct OcrJsonSource;

impl PageSource for OcrJsonSource {
    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        sorted_entries(dir, Path::is_dir)
    }

    fn load_document(&self, path: &Path) -> Result<Vec<PageRecord>> {
        let source_id = file_name_string(path)?;
        let json_files = sorted_entries(path, |entry| {
            entry.is_file()
                && entry
                    .extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
        })?;

        let mut records = Vec::new();
        for json_path in json_files {
            let raw = fs::read_to_string(&json_path)
                .with_context(|| format!("failed to read {}", json_path.display()))?;
            records.extend(parse_vision_output(&source_id, &raw, &json_path)?);
        }
        Ok(records)
    }
}

pub(super) fn parse_vision_output(
    source_id: &str,
    raw: &str,
    origin: &Path,
) -> Result<Vec<PageRecord>> {
    let output: VisionOutput = serde_json::from_str(raw)
        .with_context(|| format!("failed to parse OCR output {}", origin.display()))?;

    let mut records = Vec::with_capacity(output.responses.len());
    for (index, response) in output.responses.into_iter().enumerate() {
        let page_number = response
            .context
            .and_then(|context| context.page_number)
            .with_context(|| {
                format!(
                    "OCR response #{index} in {} has no context.pageNumber",
                    origin.display()
                )
            })?;
        let text = response
            .full_text_annotation
            .map(|annotation| annotation.text.trim().to_string())
            .unwrap_or_default();

        let record = PageRecord {
            source_id: source_id.to_string(),
            page_number,
            text,
        };
        validate_page_record(&record, origin)?;
        records.push(record);
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct VisionOutput {
    #[serde(default)]
    responses: Vec<VisionResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionResponse {
    context: Option<VisionContext>,
    full_text_annotation: Option<VisionAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionContext {
    page_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VisionAnnotation {
    #[serde(default)]
    text: String,
}
