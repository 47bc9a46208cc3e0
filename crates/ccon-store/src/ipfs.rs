//! # IPFS Content Store
//!
//! Talks to any Kubo-compatible RPC endpoint (a local node or a pinning
//! service exposing the same API):
//!
//! | Operation | Request                                   | Response            |
//! |-----------|-------------------------------------------|---------------------|
//! | publish   | `POST {api}/api/v0/add?pin=true` (multipart `file`) | `{"Hash": "<cid>"}` |
//! | fetch     | `POST {api}/api/v0/cat?arg=<cid>`         | raw bytes           |
//!
//! Requests are one-shot with a per-request timeout. CIDs are trusted as
//! returned by the node; integrity of fetched bytes is the node's concern.

use std::time::Duration;

use async_trait::async_trait;
use ccon_core::ContentAddress;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::traits::ContentStore;

/// Response body of `/api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Content store backed by an IPFS node.
#[derive(Debug, Clone)]
pub struct IpfsContentStore {
    http: reqwest::Client,
    api_url: Url,
}

impl IpfsContentStore {
    /// Build a client for the RPC endpoint at `api_url`.
    ///
    /// `token`, when present, is sent as a bearer token on every request.
    pub fn new(
        api_url: Url,
        token: Option<&Zeroizing<String>>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| StoreError::Config("IPFS token contains invalid header characters".into()))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build IPFS HTTP client: {e}")))?;
        Ok(Self { http, api_url })
    }

    fn endpoint(&self, rpc: &str) -> String {
        format!("{}/api/v0/{rpc}", self.api_url.as_str().trim_end_matches('/'))
    }
}

fn unavailable(operation: &'static str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        operation,
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name("ledger.json")
            .mime_str("application/json")
            .map_err(|e| unavailable("publish", e))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.endpoint("add"))
            .query(&[("pin", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| unavailable("publish", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(unavailable("publish", format!("HTTP {status}: {body}")));
        }

        let added: AddResponse = resp
            .json()
            .await
            .map_err(|e| unavailable("publish", format!("unexpected add response: {e}")))?;
        let address = ContentAddress::new(added.hash)
            .map_err(|e| unavailable("publish", format!("node returned {e}")))?;

        tracing::info!(%address, size = bytes.len(), "published blob to IPFS");
        Ok(address)
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        let resp = self
            .http
            .post(self.endpoint("cat"))
            .query(&[("arg", address.as_str())])
            .send()
            .await
            .map_err(|e| unavailable("fetch", e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(address.clone()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(unavailable("fetch", format!("HTTP {status}: {body}")));
        }

        let bytes = resp.bytes().await.map_err(|e| unavailable("fetch", e))?;
        Ok(bytes.to_vec())
    }

    fn backend(&self) -> &'static str {
        "ipfs"
    }
}
