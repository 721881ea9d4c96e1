use super::*;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("ingest-{}", utc_compact_string(started_ts));
    let manifest_path = args.manifest_dir.join(format!(
        "ingest_run_{}.json",
        utc_compact_string(started_ts)
    ));

    info!(
        data_dir = %args.data_dir.display(),
        source = args.source.as_str(),
        run_id = %run_id,
        dry_run = args.dry_run,
        "starting ingest"
    );

    let splitter = ChunkSplitter::new(args.chunk_size, args.chunk_overlap)?;
    let namer = NamespaceNamer::new()?;
    let source = build_page_source(&args);

    let prepared = prepare_run(
        source.as_ref(),
        &args.data_dir,
        &splitter,
        args.unanchored_policy,
        &namer,
    )?;
    let failed_documents = prepared.failed_documents();
    let chunks = chunk_previews(&prepared.records);

    let mut namespaces = Vec::new();
    let mut cleared_namespaces = Vec::new();
    let mut upload_error = None;
    if args.dry_run {
        info!(chunks = prepared.records.len(), "dry run: skipping embedding and upload");
    } else {
        let groups = namer.group_by_namespace(prepared.records);
        match upload_groups(&args, &groups) {
            Ok((cleared, reports)) => {
                cleared_namespaces = cleared;
                namespaces = reports;
            }
            Err(stage_error) => {
                error!(error = %format!("{stage_error:#}"), "upload stage failed");
                upload_error = Some(stage_error);
            }
        }
    }

    let failed_namespaces = namespaces
        .iter()
        .filter(|report| report.failure.is_some())
        .count();
    let total_uploaded = namespaces.iter().map(|report| report.uploaded).sum::<usize>();

    let manifest = IngestRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: match upload_error {
            Some(_) => "failed".to_string(),
            None => run_status(args.dry_run, failed_documents + failed_namespaces).to_string(),
        },
        started_at,
        updated_at: now_utc_string(),
        config: config_snapshot(&args, &splitter),
        page_record_count: prepared.page_record_count,
        documents: prepared.documents,
        namespaces,
        cleared_namespaces,
        total_uploaded,
        chunks,
        warnings: prepared.warnings,
        failure: upload_error.as_ref().map(|stage_error| format!("{stage_error:#}")),
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        documents = manifest.documents.len(),
        chunks = manifest.chunks.len(),
        uploaded = total_uploaded,
        manifest = %manifest_path.display(),
        "ingest finished"
    );

    if let Some(stage_error) = upload_error {
        return Err(stage_error.context(format!(
            "ingest upload stage failed; see {}",
            manifest_path.display()
        )));
    }

    if failed_documents + failed_namespaces > 0 {
        bail!(
            "ingest finished with {failed_documents} failed document(s) and {failed_namespaces} failed namespace(s); see {}",
            manifest_path.display()
        );
    }

    Ok(())
}

fn upload_groups(
    args: &IngestArgs,
    groups: &[(String, Vec<ChunkRecord>)],
) -> Result<(Vec<String>, Vec<NamespaceReport>)> {
    let embedder = build_embedder(args)?;
    let mut store = open_store(&args.store)?;

    let mut cleared_namespaces = Vec::new();
    if args.reset {
        cleared_namespaces = reset_store(store.as_mut())?;
        info!(cleared = cleared_namespaces.len(), "vector store reset");
    }

    info!(
        model = embedder.model_id(),
        store = args.store.store.as_str(),
        batch_size = args.batch_size,
        "uploading chunks"
    );
    let reports = UploadBatcher::new(embedder.as_ref(), store.as_mut(), args.batch_size)?
        .upload_all(groups);

    Ok((cleared_namespaces, reports))
}
