use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use super::*;
use crate::cli::{Cli, Commands};
use crate::store::{SqliteVectorStore, VectorStore};

struct Workspace {
    _root: tempfile::TempDir,
    data_dir: PathBuf,
    db_path: PathBuf,
    manifest_dir: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let data_dir = root.path().join("ocr");
        fs::create_dir_all(&data_dir).expect("mkdir data");
        Self {
            data_dir,
            db_path: root.path().join("store/vectors.sqlite"),
            manifest_dir: root.path().join("manifests"),
            _root: root,
        }
    }

    fn write_document(&self, name: &str, file: &str, pages: &[(u32, &str)]) {
        let dir = self.data_dir.join(name);
        fs::create_dir_all(&dir).expect("mkdir document");
        let responses = pages
            .iter()
            .map(|(page_number, text)| {
                serde_json::json!({
                    "fullTextAnnotation": {"text": text},
                    "context": {"pageNumber": page_number}
                })
            })
            .collect::<Vec<_>>();
        fs::write(
            dir.join(file),
            serde_json::to_string(&serde_json::json!({ "responses": responses })).expect("json"),
        )
        .expect("write ocr json");
    }

    fn args(&self, extra: &[&str]) -> IngestArgs {
        let mut argv = vec![
            "pagechunk".to_string(),
            "ingest".to_string(),
            "--source".to_string(),
            "ocr-json".to_string(),
            "--data-dir".to_string(),
            self.data_dir.display().to_string(),
            "--db-path".to_string(),
            self.db_path.display().to_string(),
            "--manifest-dir".to_string(),
            self.manifest_dir.display().to_string(),
            "--chunk-size".to_string(),
            "40".to_string(),
            "--chunk-overlap".to_string(),
            "0".to_string(),
            "--batch-size".to_string(),
            "2".to_string(),
            "--embedding-dim".to_string(),
            "16".to_string(),
        ];
        argv.extend(extra.iter().map(|value| value.to_string()));

        match Cli::try_parse_from(argv).expect("cli should parse").command {
            Commands::Ingest(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn manifest(&self) -> Value {
        let entries = fs::read_dir(&self.manifest_dir)
            .expect("manifest dir")
            .map(|entry| entry.expect("entry").path())
            .collect::<Vec<_>>();
        assert_eq!(entries.len(), 1, "expected one manifest: {entries:?}");
        serde_json::from_slice(&fs::read(&entries[0]).expect("read manifest")).expect("parse")
    }

    fn count(&self, namespace: &str) -> usize {
        SqliteVectorStore::open(&self.db_path)
            .expect("open store")
            .count(namespace)
            .expect("count")
    }
}

const CLAUSE_ONE: &str = "Clausula primera: el plazo de ejecucion es de doce meses.";
const CLAUSE_TWO: &str = "Clausula segunda: el precio se revisa cada trimestre natural.";

#[test]
fn dry_run_writes_manifest_without_touching_store() {
    let workspace = Workspace::new();
    workspace.write_document(
        "Contrato 854",
        "output-1-to-3.json",
        &[(2, CLAUSE_TWO), (1, CLAUSE_ONE), (3, "")],
    );

    run(workspace.args(&["--dry-run"])).expect("dry run");

    assert!(!workspace.db_path.exists());
    let manifest = workspace.manifest();
    assert_eq!(manifest["status"], "dry_run");
    assert_eq!(manifest["page_record_count"], 3);
    assert_eq!(manifest["total_uploaded"], 0);
    assert_eq!(manifest["config"]["chunk_size"], 40);

    let document = &manifest["documents"][0];
    assert_eq!(document["source_id"], "Contrato 854");
    assert_eq!(document["namespace"], "contrato_854");
    assert_eq!(document["page_count"], 3);
    assert_eq!(document["empty_page_count"], 1);

    let chunks = manifest["chunks"].as_array().expect("chunks");
    assert!(chunks.len() >= 2);
    assert_eq!(chunks[0]["id"], "Contrato 854:1:0");
    assert_eq!(chunks[0]["start_offset"], 0);
    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk["local_index"], index);
        let pages = chunk["pages"].as_array().expect("pages");
        assert!(!pages.iter().any(|page| page == "3"), "empty page attributed: {chunk}");
    }
}

#[test]
fn upload_is_idempotent_and_reset_clears_old_namespaces() {
    let workspace = Workspace::new();
    workspace.write_document("Obra 855", "output-1-to-2.json", &[(1, CLAUSE_ONE), (2, CLAUSE_TWO)]);

    run(workspace.args(&[])).expect("first upload");
    let first_count = workspace.count("obra_855");
    assert!(first_count >= 2);

    let manifest = workspace.manifest();
    assert_eq!(manifest["status"], "completed");
    assert_eq!(manifest["total_uploaded"], first_count);
    let batches = manifest["namespaces"][0]["batches"].as_array().expect("batches");
    assert_eq!(batches[0]["batch_size"], 2);
    assert_eq!(batches.last().expect("last batch")["uploaded"], first_count);
    fs::remove_dir_all(&workspace.manifest_dir).expect("clear manifests");

    run(workspace.args(&[])).expect("second upload");
    assert_eq!(workspace.count("obra_855"), first_count);
    fs::remove_dir_all(&workspace.manifest_dir).expect("clear manifests");

    fs::remove_dir_all(workspace.data_dir.join("Obra 855")).expect("remove document");
    workspace.write_document("Plazos", "output-1-to-1.json", &[(1, CLAUSE_TWO)]);
    run(workspace.args(&["--reset"])).expect("reset upload");

    assert_eq!(workspace.count("obra_855"), 0);
    assert!(workspace.count("plazos") >= 1);
    let manifest = workspace.manifest();
    assert_eq!(manifest["cleared_namespaces"], serde_json::json!(["obra_855"]));
}

#[test]
fn broken_document_is_recorded_and_others_still_upload() {
    let workspace = Workspace::new();
    workspace.write_document("Bueno", "output-1-to-1.json", &[(1, CLAUSE_ONE)]);
    let broken = workspace.data_dir.join("Roto");
    fs::create_dir_all(&broken).expect("mkdir");
    fs::write(broken.join("output-1-to-1.json"), "{not json").expect("write");

    let error = run(workspace.args(&[])).expect_err("run should report failure");
    assert!(error.to_string().contains("1 failed document(s)"), "{error}");

    assert!(workspace.count("bueno") >= 1);
    let manifest = workspace.manifest();
    assert_eq!(manifest["status"], "completed_with_failures");
    let documents = manifest["documents"].as_array().expect("documents");
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["source_id"], "Bueno");
    assert!(documents[0]["failure"].is_null());
    assert_eq!(documents[1]["source_id"], "Roto");
    assert!(
        documents[1]["failure"]
            .as_str()
            .is_some_and(|failure| failure.contains("failed to parse OCR output"))
    );
}

#[test]
fn duplicate_pages_fail_only_their_document() {
    let workspace = Workspace::new();
    workspace.write_document("Dup", "output-1-to-1.json", &[(1, CLAUSE_ONE)]);
    workspace.write_document("Dup", "output-1-to-1-again.json", &[(1, CLAUSE_TWO)]);
    workspace.write_document("Solo", "output-1-to-1.json", &[(1, CLAUSE_TWO)]);

    assert!(run(workspace.args(&["--dry-run"])).is_err());

    let manifest = workspace.manifest();
    assert_eq!(manifest["status"], "dry_run_with_failures");
    let documents = manifest["documents"].as_array().expect("documents");
    assert!(documents[0]["failure"].is_string());
    assert!(documents[1]["failure"].is_null());
    assert!(
        manifest["chunks"]
            .as_array()
            .expect("chunks")
            .iter()
            .all(|chunk| chunk["id"].as_str().is_some_and(|id| id.starts_with("Solo:")))
    );
}

#[test]
fn invalid_splitter_settings_abort_before_loading() {
    let workspace = Workspace::new();

    let mut args = workspace.args(&[]);
    args.chunk_overlap = 40;

    let error = run(args).expect_err("overlap too large");
    assert!(error.to_string().contains("chunk overlap"));
    assert!(!workspace.manifest_dir.exists());
}

#[test]
fn store_setup_failure_still_writes_manifest() {
    let workspace = Workspace::new();
    workspace.write_document("Obra 855", "output-1-to-2.json", &[(1, CLAUSE_ONE), (2, CLAUSE_TWO)]);
    let blocker = workspace.data_dir.parent().expect("root").join("blocker");
    fs::write(&blocker, "not a directory").expect("write blocker");

    let mut args = workspace.args(&[]);
    args.store.db_path = blocker.join("vectors.sqlite");

    let error = run(args).expect_err("store cannot be opened");
    assert!(format!("{error:#}").contains("upload stage failed"), "{error:#}");

    let manifest = workspace.manifest();
    assert_eq!(manifest["status"], "failed");
    assert!(
        manifest["failure"]
            .as_str()
            .is_some_and(|failure| failure.contains("failed to create directory"))
    );
    assert_eq!(manifest["documents"][0]["source_id"], "Obra 855");
    assert!(manifest["documents"][0]["chunk_count"].as_u64().is_some_and(|count| count >= 2));
    assert!(manifest["chunks"].as_array().is_some_and(|chunks| chunks.len() >= 2));
    assert_eq!(manifest["total_uploaded"], 0);
}

#[test]
fn successful_run_records_no_failure() {
    let workspace = Workspace::new();
    workspace.write_document("Plazos", "output-1-to-1.json", &[(1, CLAUSE_ONE)]);

    run(workspace.args(&["--dry-run"])).expect("dry run");

    assert!(workspace.manifest()["failure"].is_null());
}
