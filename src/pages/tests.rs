use std::fs;
use std::path::Path;

use super::ocr_json::parse_vision_output;
use super::pdftotext::split_form_feed_pages;
use super::*;

#[test]
fn form_feed_split_drops_trailing_blank_pages() {
    let pages = split_form_feed_pages("first page\n\u{000C}  second\u{0000} page \u{000C}\n\u{000C}");

    assert_eq!(pages, vec!["first page".to_string(), "second page".to_string()]);
}

#[test]
fn form_feed_split_keeps_interior_blank_pages() {
    let pages = split_form_feed_pages("one\u{000C}\u{000C}three\u{000C}");

    assert_eq!(
        pages,
        vec!["one".to_string(), String::new(), "three".to_string()]
    );
}

#[test]
fn vision_output_maps_responses_to_pages() {
    let raw = r#"{
        "inputConfig": {"mimeType": "application/pdf"},
        "responses": [
            {"fullTextAnnotation": {"text": "Clausula primera\n"}, "context": {"pageNumber": 11}},
            {"context": {"pageNumber": 12}}
        ]
    }"#;

    let records =
        parse_vision_output("contrato_854", raw, Path::new("output-11-to-20.json")).expect("parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].page_number, 11);
    assert_eq!(records[0].text, "Clausula primera");
    assert_eq!(records[1].page_number, 12);
    assert_eq!(records[1].text, "");
    assert!(records.iter().all(|record| record.source_id == "contrato_854"));
}

#[test]
fn vision_output_without_page_number_is_rejected() {
    let raw = r#"{"responses": [{"fullTextAnnotation": {"text": "orphan"}}]}"#;

    let error = parse_vision_output("contrato_854", raw, Path::new("broken.json"))
        .expect_err("missing page number should fail");
    assert!(error.to_string().contains("broken.json"));
}

#[test]
fn vision_output_with_page_zero_is_rejected() {
    let raw = r#"{"responses": [{"context": {"pageNumber": 0}}]}"#;

    assert!(parse_vision_output("contrato_854", raw, Path::new("zero.json")).is_err());
}

#[test]
fn validation_rejects_blank_source_id() {
    let record = PageRecord {
        source_id: "  ".to_string(),
        page_number: 1,
        text: "text".to_string(),
    };

    assert!(validate_page_record(&record, Path::new("input.json")).is_err());
}

#[test]
fn ocr_source_reads_one_document_per_directory() {
    let root = tempfile::tempdir().expect("tempdir");
    let first = root.path().join("obra_855");
    let second = root.path().join("contrato_854");
    fs::create_dir_all(&first).expect("mkdir");
    fs::create_dir_all(&second).expect("mkdir");
    fs::write(root.path().join("stray.json"), "{}").expect("write stray");

    fs::write(
        first.join("output-1-to-2.json"),
        r#"{"responses": [
            {"fullTextAnnotation": {"text": "a"}, "context": {"pageNumber": 1}},
            {"fullTextAnnotation": {"text": "b"}, "context": {"pageNumber": 2}}
        ]}"#,
    )
    .expect("write");
    fs::write(
        second.join("output-1-to-1.json"),
        r#"{"responses": [{"fullTextAnnotation": {"text": "c"}, "context": {"pageNumber": 1}}]}"#,
    )
    .expect("write");
    fs::write(second.join("notes.txt"), "ignored").expect("write");

    let source = OcrJsonSource;
    let documents = source.list_documents(root.path()).expect("list");
    assert_eq!(documents, vec![second.clone(), first.clone()]);

    let records = documents
        .iter()
        .flat_map(|path| source.load_document(path).expect("load"))
        .collect::<Vec<_>>();
    let summary = records
        .iter()
        .map(|record| (record.source_id.as_str(), record.page_number, record.text.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("contrato_854", 1, "c"),
            ("obra_855", 1, "a"),
            ("obra_855", 2, "b"),
        ]
    );
}

#[test]
fn pdf_source_lists_only_pdf_files() {
    let root = tempfile::tempdir().expect("tempdir");
    fs::write(root.path().join("b.PDF"), b"%PDF").expect("write");
    fs::write(root.path().join("a.pdf"), b"%PDF").expect("write");
    fs::write(root.path().join("readme.txt"), b"text").expect("write");
    fs::create_dir_all(root.path().join("nested.pdf")).expect("mkdir");

    let documents = PdfTextSource::new(None)
        .list_documents(root.path())
        .expect("list");

    assert_eq!(
        documents,
        vec![root.path().join("a.pdf"), root.path().join("b.PDF")]
    );
}
