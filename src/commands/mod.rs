pub mod ingest;
pub mod namespaces;
