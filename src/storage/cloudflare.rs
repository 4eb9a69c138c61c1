use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{StorageAdapter, StorageError};
use crate::config::{CloudflareConfig, Config};

const API_BASE: &str = "https://api.cloudflare.com/client/v4";
const LIST_PAGE_LIMIT: u32 = 1000;

/// Adapter for the Cloudflare Workers KV REST API.
///
/// Records live under
/// `accounts/{account}/storage/kv/namespaces/{namespace}/values/{key}`.
/// Reading an absent key answers 404, which maps to `Ok(None)` here so the
/// rest of the service never sees backend status codes.
#[derive(Debug, Clone)]
pub struct CloudflareKv {
    http: Client,
    namespace_base: Url,
    api_token: String,
}

impl CloudflareKv {
    /// Create an adapter from configuration.
    ///
    /// Requires the `CLOUDFLARE_*` credentials to be present; the config
    /// loader guarantees that when this backend is selected.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config
            .cloudflare
            .as_ref()
            .context("Cloudflare backend selected but credentials are missing")?;
        Self::new(API_BASE, credentials, config.storage_timeout)
    }

    /// Create an adapter against an explicit API base URL.
    ///
    /// `api_base` is overridable so tests can point the adapter at a local
    /// mock server instead of the real API.
    pub fn new(
        api_base: &str,
        credentials: &CloudflareConfig,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let namespace_base = Url::parse(&format!(
            "{}/accounts/{}/storage/kv/namespaces/{}/",
            api_base.trim_end_matches('/'),
            credentials.account_id,
            credentials.namespace_id
        ))
        .context("Failed to build Cloudflare KV namespace URL")?;

        Ok(Self {
            http,
            namespace_base,
            api_token: credentials.api_token.clone(),
        })
    }

    /// URL of the value endpoint for `key`, with the key percent-encoded as
    /// a single path segment.
    fn value_url(&self, key: &str) -> Result<Url, StorageError> {
        let mut url = self.namespace_base.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::backend("namespace URL cannot be a base"))?
            .pop_if_empty()
            .push("values")
            .push(key);
        Ok(url)
    }

    fn keys_url(&self, cursor: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.namespace_base.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::backend("namespace URL cannot be a base"))?
            .pop_if_empty()
            .push("keys");
        url.query_pairs_mut()
            .append_pair("limit", &LIST_PAGE_LIMIT.to_string());
        if let Some(cursor) = cursor {
            url.query_pairs_mut().append_pair("cursor", cursor);
        }
        Ok(url)
    }
}

/// Map transport failures onto the adapter error taxonomy. Timeouts and
/// connect errors count as the backend being unreachable.
fn request_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() || err.is_connect() {
        StorageError::unavailable(err.to_string())
    } else {
        StorageError::backend_with_source("request to Cloudflare KV failed", err)
    }
}

/// Build an error from an unexpected response status. The body excerpt is
/// for logs only and never reaches clients.
async fn status_error(operation: &str, key: &str, response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    StorageError::backend(format!(
        "kv {operation} '{key}' answered HTTP {status}: {excerpt}"
    ))
}

#[async_trait]
impl StorageAdapter for CloudflareKv {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let url = self.value_url(key)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Key not found: {}", key);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error("get", key, response).await);
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        tracing::debug!("Fetched {} bytes for key: {}", bytes.len(), key);
        Ok(Some(bytes))
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<(), StorageError> {
        let url = self.value_url(key)?;
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.api_token)
            .body(value)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(status_error("put", key, response).await);
        }

        tracing::debug!("Stored value for key: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let url = self.value_url(key)?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(request_error)?;

        // The API answers 404 when the key was never written; deleting an
        // absent key still counts as success for this adapter.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Deleted key: {}", key);
            return Ok(());
        }

        Err(status_error("delete", key, response).await)
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = self.keys_url(cursor.as_deref())?;
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(request_error)?;

            if !response.status().is_success() {
                return Err(status_error("list", "*", response).await);
            }

            let page: ListKeysResponse = response.json().await.map_err(request_error)?;
            keys.extend(page.result.into_iter().map(|entry| entry.name));

            // The API signals the last page with a missing or empty cursor
            cursor = page
                .result_info
                .and_then(|info| info.cursor)
                .filter(|cursor| !cursor.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!("Listed {} keys", keys.len());
        Ok(keys)
    }
}

#[derive(Debug, Deserialize)]
struct ListKeysResponse {
    result: Vec<KeyEntry>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    cursor: Option<String>,
}
