use bytes::Bytes;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::storage::{StorageAdapter, StorageError};

/// The shared dictionary as stored: one JSON object mapping keys to values.
pub type Document = serde_json::Map<String, JsonValue>;

/// Errors from dictionary operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request failed validation before any storage I/O happened.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stored document is not a JSON object. The document is left
    /// untouched so the damage can be inspected.
    #[error("stored document is corrupted: {0}")]
    CorruptDocument(String),

    /// The detached merge task did not run to completion. Whether the write
    /// committed is unknown.
    #[error("merge task failed: {0}")]
    MergeFailed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The shared dictionary, persisted as a single JSON document in the
/// storage backend.
///
/// Every mutation is a read-modify-write sequence: fetch the whole document,
/// apply one change, write the whole document back. The backend offers no
/// conditional writes, so sequences are serialized through a process-local
/// mutex. Two separate processes can still race each other; the last write
/// wins and the losing update is silently dropped. Run a single instance
/// against one namespace to avoid that.
#[derive(Clone)]
pub struct DictStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    storage: Arc<dyn StorageAdapter>,
    document_key: String,
    merge_lock: Mutex<()>,
}

impl DictStore {
    /// Create a store that keeps the dictionary under `document_key`.
    pub fn new(storage: Arc<dyn StorageAdapter>, document_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                storage,
                document_key: document_key.into(),
                merge_lock: Mutex::new(()),
            }),
        }
    }

    /// Read the whole dictionary.
    ///
    /// A missing document reads as an empty dictionary; the first mutation
    /// creates it. Reads are point-in-time and do not wait for in-flight
    /// mutations.
    ///
    /// # Errors
    /// Returns `CorruptDocument` if the stored bytes are not a JSON object,
    /// or `Storage` if the backend fails.
    pub async fn read_all(&self) -> Result<Document, StoreError> {
        self.load().await
    }

    /// Insert or overwrite one entry and return the resulting dictionary.
    ///
    /// `value` may be any JSON value, including `null`. Unrelated entries
    /// are preserved.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty key (checked before any
    /// storage I/O), `CorruptDocument` if the stored document cannot be
    /// merged into, or `Storage` if the backend fails.
    pub async fn set_entry(&self, key: &str, value: JsonValue) -> Result<Document, StoreError> {
        validate_key(key)?;

        let store = self.clone();
        let key = key.to_string();
        run_detached(async move {
            let _guard = store.inner.merge_lock.lock().await;
            let mut document = store.load().await?;
            document.insert(key, value);
            store.persist(&document).await?;
            Ok(document)
        })
        .await
    }

    /// Remove one entry and return the resulting dictionary.
    ///
    /// Deleting a key that is not present succeeds without writing the
    /// document back.
    ///
    /// # Errors
    /// Same taxonomy as [`DictStore::set_entry`].
    pub async fn delete_entry(&self, key: &str) -> Result<Document, StoreError> {
        validate_key(key)?;

        let store = self.clone();
        let key = key.to_string();
        run_detached(async move {
            let _guard = store.inner.merge_lock.lock().await;
            let mut document = store.load().await?;
            if document.remove(&key).is_some() {
                store.persist(&document).await?;
            }
            Ok(document)
        })
        .await
    }

    async fn load(&self) -> Result<Document, StoreError> {
        let raw = self.inner.storage.get(&self.inner.document_key).await?;
        match raw {
            None => Ok(Document::new()),
            Some(bytes) => parse_document(&bytes),
        }
    }

    async fn persist(&self, document: &Document) -> Result<(), StoreError> {
        // Pretty-printed so the stored document stays readable in the
        // backend's own dashboard
        let raw = serde_json::to_vec_pretty(document)
            .map_err(|err| StorageError::backend(format!("failed to serialize document: {err}")))?;
        self.inner
            .storage
            .put(&self.inner.document_key, Bytes::from(raw))
            .await?;
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidArgument(
            "key must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

fn parse_document(raw: &[u8]) -> Result<Document, StoreError> {
    match serde_json::from_slice::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::CorruptDocument(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
        Err(err) => Err(StoreError::CorruptDocument(format!("not valid JSON: {err}"))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Run a read-modify-write sequence on its own task.
///
/// The handler future is dropped when the client disconnects. Running the
/// sequence detached means a write that has started always runs to
/// completion, so the document is never left half-merged.
async fn run_detached<F>(sequence: F) -> Result<Document, StoreError>
where
    F: Future<Output = Result<Document, StoreError>> + Send + 'static,
{
    match tokio::spawn(sequence).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::MergeFailed(err.to_string())),
    }
}
