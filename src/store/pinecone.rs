use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{StoreError, VectorStore};
use crate::model::{VectorMetadata, VectorRecord};

const API_VERSION: &str = "2024-07";

/// Data-plane client for a single Pinecone index host.
pub struct PineconeStore {
    client: Client,
    base_url: String,
}

impl PineconeStore {
    pub fn new(api_key: &str, index_host: &str, timeout: Duration) -> Result<Self> {
        ensure!(!api_key.trim().is_empty(), "missing Pinecone API key");
        ensure!(!index_host.trim().is_empty(), "missing Pinecone index host");

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("api-key"),
            HeaderValue::from_str(api_key.trim()).context("invalid Pinecone API key")?,
        );
        headers.insert(
            HeaderName::from_static("x-pinecone-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Pinecone HTTP client")?;

        Ok(Self {
            client,
            base_url: index_base_url(index_host),
        })
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, StoreError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()?;
        Ok(response)
    }

    fn describe_index_stats(&self) -> Result<IndexStats, StoreError> {
        let response = check_status(self.post("/describe_index_stats", &serde_json::json!({}))?)?;
        Ok(response.json::<IndexStats>()?)
    }
}

impl VectorStore for PineconeStore {
    fn upsert(&mut self, namespace: &str, records: &[VectorRecord]) -> Result<(), StoreError> {
        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|record| UpsertVector {
                    id: &record.id,
                    values: &record.embedding,
                    metadata: &record.metadata,
                })
                .collect(),
            namespace,
        };

        check_status(self.post("/vectors/upsert", &request)?)?;
        Ok(())
    }

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.describe_index_stats()?.namespaces.into_keys().collect())
    }

    fn delete_all(&mut self, namespace: &str) -> Result<(), StoreError> {
        let request = DeleteRequest {
            delete_all: true,
            namespace,
        };

        let response = self.post("/vectors/delete", &request)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(namespace.to_string()));
        }
        check_status(response)?;
        Ok(())
    }

    fn count(&self, namespace: &str) -> Result<usize, StoreError> {
        Ok(self
            .describe_index_stats()?
            .namespaces
            .get(namespace)
            .map_or(0, |summary| summary.vector_count))
    }
}

fn index_base_url(index_host: &str) -> String {
    let host = index_host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(StoreError::Api(format!("{status}: {body}")))
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a VectorMetadata,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    #[serde(rename = "deleteAll")]
    delete_all: bool,
    namespace: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStats {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceSummary>,
}

#[derive(Debug, Deserialize)]
struct NamespaceSummary {
    #[serde(rename = "vectorCount", default)]
    vector_count: usize,
}
