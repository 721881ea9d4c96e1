use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::NamespacesArgs;
use crate::store::open_store;

pub fn run(args: NamespacesArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let namespaces = store
        .list_namespaces()
        .context("failed to list namespaces")?;

    info!(
        store = args.store.store.as_str(),
        namespaces = namespaces.len(),
        "namespaces requested"
    );

    if namespaces.is_empty() {
        warn!("vector store has no namespaces");
        return Ok(());
    }

    for namespace in &namespaces {
        let records = store
            .count(namespace)
            .with_context(|| format!("failed to count records in namespace {namespace}"))?;
        info!(namespace = %namespace, records, "namespace");
    }

    Ok(())
}
