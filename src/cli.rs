use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::upload::DEFAULT_BATCH_SIZE;

#[derive(Parser, Debug)]
#[command(
    name = "pagechunk",
    version,
    about = "Page-aware document chunking and vector index upload"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Namespaces(NamespacesArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceKind {
    Pdf,
    OcrJson,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::OcrJson => "ocr-json",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum UnanchoredPolicy {
    #[default]
    AllPages,
    NoPages,
    Reject,
}

impl UnanchoredPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllPages => "all-pages",
            Self::NoPages => "no-pages",
            Self::Reject => "reject",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmbedderKind {
    LocalHash,
    Openai,
}

impl EmbedderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalHash => "local-hash",
            Self::Openai => "openai",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StoreKind {
    Sqlite,
    Pinecone,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Pinecone => "pinecone",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    #[arg(long, env = "PAGECHUNK_DB_PATH", default_value = ".cache/pagechunk/vectors.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: Option<String>,

    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_index_host: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, env = "PAGECHUNK_DATA_DIR", default_value = "data/raw")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SourceKind::Pdf)]
    pub source: SourceKind,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = UnanchoredPolicy::AllPages)]
    pub unanchored_policy: UnanchoredPolicy,

    #[arg(long, default_value_t = false)]
    pub reset: bool,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = EmbedderKind::LocalHash)]
    pub embedder: EmbedderKind,

    #[arg(long, default_value_t = 384)]
    pub embedding_dim: usize,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, default_value = ".cache/pagechunk/manifests")]
    pub manifest_dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct NamespacesArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
