use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local storage, for development and tests
    Memory,
    /// Cloudflare Workers KV over its REST API
    Cloudflare,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "memory" => Ok(BackendKind::Memory),
            "cloudflare" => Ok(BackendKind::Cloudflare),
            other => Err(anyhow::anyhow!(
                "STORAGE_BACKEND must be 'memory' or 'cloudflare', got '{other}'"
            )),
        }
    }
}

/// Credentials for the Cloudflare KV REST API.
#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub account_id: String,
    pub namespace_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub cloudflare: Option<CloudflareConfig>,
    /// Storage key under which the whole dictionary document lives
    pub document_key: String,
    pub storage_timeout: Duration,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse::<BackendKind>()?;

        let cloudflare = match backend {
            BackendKind::Cloudflare => Some(CloudflareConfig {
                account_id: env::var("CLOUDFLARE_ACCOUNT_ID")
                    .context("CLOUDFLARE_ACCOUNT_ID is required for the cloudflare backend")?,
                namespace_id: env::var("CLOUDFLARE_NAMESPACE_ID")
                    .context("CLOUDFLARE_NAMESPACE_ID is required for the cloudflare backend")?,
                api_token: env::var("CLOUDFLARE_API_TOKEN")
                    .context("CLOUDFLARE_API_TOKEN is required for the cloudflare backend")?,
            }),
            BackendKind::Memory => None,
        };

        let document_key = env::var("DICT_DOCUMENT_KEY")
            .unwrap_or_else(|_| "cloud_dict".to_string());

        let storage_timeout_secs = env::var("STORAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .context("STORAGE_TIMEOUT_SECS must be a whole number of seconds")?;

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            backend,
            cloudflare,
            document_key,
            storage_timeout: Duration::from_secs(storage_timeout_secs),
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Storage backend: {:?}", self.backend);
        if let Some(cloudflare) = &self.cloudflare {
            tracing::info!("  Cloudflare account: {}", cloudflare.account_id);
            tracing::info!("  Cloudflare namespace: {}", cloudflare.namespace_id);
            // Never log the API token
        }
        tracing::info!("  Document key: {}", self.document_key);
        tracing::info!("  Storage timeout: {:?}", self.storage_timeout);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}
