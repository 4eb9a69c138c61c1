use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{BackendKind, Config};

pub mod cloudflare;
pub mod memory;

pub use cloudflare::CloudflareKv;
pub use memory::MemoryAdapter;

/// Errors surfaced by a storage backend.
///
/// These carry backend detail (HTTP status lines, connection errors) that is
/// meant for logs. Response bodies built from them must stay generic.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend answered but the operation failed.
    #[error("storage operation failed: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend could not be reached at all (connect error, timeout).
    #[error("storage backend unreachable: {message}")]
    Unavailable { message: String },
}

impl StorageError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Uniform interface over the external key-value store.
///
/// Handlers and the dictionary store only ever see this trait, so tests can
/// swap in in-memory or failing backends without touching any wiring.
///
/// The contract mirrors what eventually-consistent KV services actually
/// offer: plain get/put/delete with no conditional writes.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Fetch the raw bytes stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// Store `value` under `key`, replacing any previous record.
    async fn put(&self, key: &str, value: Bytes) -> Result<(), StorageError>;

    /// Remove the record under `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List every key in the namespace.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Build the storage adapter selected by configuration.
///
/// `STORAGE_BACKEND=memory` keeps everything process-local for development;
/// `STORAGE_BACKEND=cloudflare` talks to the Workers KV REST API.
pub fn from_config(config: &Config) -> Result<Arc<dyn StorageAdapter>> {
    match config.backend {
        BackendKind::Memory => {
            tracing::info!("Using in-memory storage backend");
            Ok(Arc::new(MemoryAdapter::new()))
        }
        BackendKind::Cloudflare => {
            tracing::info!("Using Cloudflare KV storage backend");
            Ok(Arc::new(CloudflareKv::from_config(config)?))
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::memory::MemoryAdapter;
    use super::{StorageAdapter, StorageError};

    /// Wraps an in-memory adapter and counts every call, so tests can assert
    /// that rejected requests never reach storage.
    #[derive(Default)]
    pub struct SpyAdapter {
        inner: MemoryAdapter,
        gets: AtomicUsize,
        puts: AtomicUsize,
        deletes: AtomicUsize,
        lists: AtomicUsize,
    }

    impl SpyAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_count(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub fn put_count(&self) -> usize {
            self.puts.load(Ordering::SeqCst)
        }

        pub fn delete_count(&self) -> usize {
            self.deletes.load(Ordering::SeqCst)
        }

        pub fn list_count(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StorageAdapter for SpyAdapter {
        async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: Bytes) -> Result<(), StorageError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }

        async fn list(&self) -> Result<Vec<String>, StorageError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }
    }

    /// Fails every operation, for exercising the unavailable-backend path.
    pub struct FailingAdapter;

    #[async_trait]
    impl StorageAdapter for FailingAdapter {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, StorageError> {
            Err(StorageError::unavailable("injected failure"))
        }

        async fn put(&self, _key: &str, _value: Bytes) -> Result<(), StorageError> {
            Err(StorageError::unavailable("injected failure"))
        }

        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::unavailable("injected failure"))
        }

        async fn list(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::unavailable("injected failure"))
        }
    }

    /// Sleeps before every operation so overlapping read-modify-write
    /// sequences genuinely interleave at the storage boundary.
    pub struct DelayAdapter {
        inner: MemoryAdapter,
        delay: Duration,
    }

    impl DelayAdapter {
        pub fn new(delay: Duration) -> Self {
            Self {
                inner: MemoryAdapter::new(),
                delay,
            }
        }
    }

    #[async_trait]
    impl StorageAdapter for DelayAdapter {
        async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: Bytes) -> Result<(), StorageError> {
            tokio::time::sleep(self.delay).await;
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            tokio::time::sleep(self.delay).await;
            self.inner.delete(key).await
        }

        async fn list(&self) -> Result<Vec<String>, StorageError> {
            self.inner.list().await
        }
    }

    /// Panics inside every operation, for exercising the fault path of the
    /// detached merge task.
    pub struct PanickingAdapter;

    #[async_trait]
    impl StorageAdapter for PanickingAdapter {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, StorageError> {
            panic!("injected panic")
        }

        async fn put(&self, _key: &str, _value: Bytes) -> Result<(), StorageError> {
            panic!("injected panic")
        }

        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            panic!("injected panic")
        }

        async fn list(&self) -> Result<Vec<String>, StorageError> {
            panic!("injected panic")
        }
    }
}
