use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::{EmbedderKind, IngestArgs};

mod local;
mod openai;

pub use local::LocalHashEmbedder;
pub use openai::OpenAiEmbedder;

/// Produces one vector per chunk text. Failures are whole-call errors.
pub trait EmbeddingService {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_id(&self) -> &str;
}

pub fn build_embedder(args: &IngestArgs) -> Result<Box<dyn EmbeddingService>> {
    match args.embedder {
        EmbedderKind::LocalHash => Ok(Box::new(LocalHashEmbedder::new(args.embedding_dim))),
        EmbedderKind::Openai => {
            let api_key = args
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is required for --embedder openai")?;
            let embedder = OpenAiEmbedder::new(
                api_key,
                &args.openai_base_url,
                &args.embedding_model,
                Duration::from_secs(args.store.timeout_secs),
            )?;
            Ok(Box::new(embedder))
        }
    }
}
