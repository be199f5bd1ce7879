//! Log Server Client
//!
//! Talks to a remote log server over HTTP and presents it as a
//! [`LogServerInterface`], so an auditor can run against either side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LogError;
use crate::hashing::{decode_hash, decode_hashes, NodeHash};
use crate::service::wire::{
    AppendBatchRequest, AppendRequest, ErrorResponse, PathResponse, ProofResponse, RootResponse,
    SizeResponse,
};
use crate::service::LogServerInterface;

pub struct LogClient {
    base_url: String,
    http_client: Client,
}

impl LogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            http_client: Client::new(),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LogError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: normalize(base_url.into()),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, LogError> {
        debug!("GET {}{}", self.base_url, route);
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, route))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: serde::Serialize>(&self, route: &str, body: &B) -> Result<(), LogError> {
        debug!("POST {}{}", self.base_url, route);
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, route))
            .json(body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

fn normalize(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Turn an error status back into the server's error variant
async fn check_status(response: Response) -> Result<Response, LogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(LogError::from_kind(&body.kind, body.error)),
        Err(_) => Err(LogError::TransportError(format!(
            "Log server responded with {}",
            status
        ))),
    }
}

#[async_trait]
impl LogServerInterface for LogClient {
    async fn get_root_hash(&self) -> Result<NodeHash, LogError> {
        let body: RootResponse = self.get_json("/root").await?;
        decode_hash(&body.root)
    }

    async fn get_size(&self) -> Result<usize, LogError> {
        let body: SizeResponse = self.get_json("/size").await?;
        Ok(body.size)
    }

    async fn append_log(&self, content: &[u8]) -> Result<(), LogError> {
        let body = AppendRequest {
            content: hex::encode(content),
        };
        self.post_json("/entries", &body).await
    }

    async fn append_logs(&self, contents: &[Vec<u8>]) -> Result<(), LogError> {
        let body = AppendBatchRequest {
            contents: contents.iter().map(hex::encode).collect(),
        };
        self.post_json("/entries/batch", &body).await
    }

    async fn gen_path(&self, index: usize) -> Result<Vec<NodeHash>, LogError> {
        let body: PathResponse = self.get_json(&format!("/path/{}", index)).await?;
        decode_hashes(&body.path)
    }

    async fn gen_proof(&self, prior_size: i64) -> Result<Vec<NodeHash>, LogError> {
        let body: ProofResponse = self
            .get_json(&format!("/proof?size={}", prior_size))
            .await?;
        decode_hashes(&body.proof)
    }
}
