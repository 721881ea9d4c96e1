use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::chunking::{ChunkSplitter, group_by_source, merge_pages, prepare_document};
use crate::cli::{IngestArgs, UnanchoredPolicy};
use crate::embedding::build_embedder;
use crate::model::{
    ChunkPreview, ChunkRecord, DocumentSummary, IngestRunManifest, NamespaceReport, PageRecord,
    RunConfigSnapshot,
};
use crate::pages::{PageSource, build_page_source};
use crate::store::open_store;
use crate::upload::{NamespaceNamer, UploadBatcher, reset_store};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

mod documents;
mod manifest;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use documents::*;
use manifest::*;
