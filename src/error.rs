use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::{Envelope, CODE_ERROR, CODE_NOT_FOUND};
use crate::storage::StorageError;
use crate::store::StoreError;

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Custom error type for API endpoints
///
/// Maps every failure onto the envelope contract. Validation failures carry
/// their message to the client; backend and corruption failures answer with
/// a fixed generic message while the detail goes to the log only.
#[derive(Debug)]
pub enum ApiError {
    /// The request failed validation; the message is safe to return
    InvalidArgument(String),
    /// No operation is mapped to this method and path
    RouteNotFound(Method, String),
    /// The stored document is not a JSON object
    CorruptDocument(String),
    /// The storage backend failed or could not be reached
    StorageUnavailable(StorageError),
    /// A fault inside the service itself, not in the backend
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            ApiError::InvalidArgument(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, Envelope::error(CODE_ERROR, msg))
            }
            ApiError::RouteNotFound(method, path) => (
                StatusCode::NOT_FOUND,
                Envelope::error(CODE_NOT_FOUND, format!("no route for {} {}", method, path)),
            ),
            ApiError::CorruptDocument(detail) => {
                tracing::error!("Stored document is corrupted: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error(CODE_ERROR, "stored dictionary is corrupted"),
                )
            }
            ApiError::StorageUnavailable(err) => {
                tracing::error!("Storage backend failure: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error(CODE_ERROR, "storage backend unavailable"),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!("Internal failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error(CODE_ERROR, "internal error"),
                )
            }
        };

        (status, Json(envelope)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            StoreError::CorruptDocument(detail) => ApiError::CorruptDocument(detail),
            StoreError::MergeFailed(detail) => ApiError::Internal(detail),
            StoreError::Storage(err) => ApiError::StorageUnavailable(err),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::StorageUnavailable(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CODE_OK;

    async fn envelope_of(error: ApiError) -> (StatusCode, Envelope) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_argument_keeps_its_message() {
        let (status, envelope) =
            envelope_of(ApiError::InvalidArgument("key must be a non-empty string".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "key must be a non-empty string");
        assert!(envelope.data.is_none());
    }

    #[tokio::test]
    async fn test_route_not_found_names_method_and_path() {
        let (status, envelope) =
            envelope_of(ApiError::RouteNotFound(Method::PATCH, "/nope".into())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.code, CODE_NOT_FOUND);
        assert!(envelope.msg.contains("PATCH"));
        assert!(envelope.msg.contains("/nope"));
    }

    #[tokio::test]
    async fn test_corrupt_document_hides_detail() {
        let (status, envelope) =
            envelope_of(ApiError::CorruptDocument("expected a JSON object, found an array".into()))
                .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "stored dictionary is corrupted");
        assert!(!envelope.msg.contains("array"));
    }

    #[tokio::test]
    async fn test_storage_failure_hides_backend_detail() {
        let backend_err = StorageError::backend("kv get 'x' answered HTTP 500: secret detail");
        let (status, envelope) = envelope_of(ApiError::StorageUnavailable(backend_err)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "storage backend unavailable");
        assert!(!envelope.msg.contains("secret detail"));
    }

    #[tokio::test]
    async fn test_internal_fault_hides_detail() {
        let (status, envelope) =
            envelope_of(ApiError::Internal("task 7 panicked".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "internal error");
        assert!(!envelope.msg.contains("panicked"));
    }

    #[tokio::test]
    async fn test_store_errors_map_onto_api_errors() {
        let invalid: ApiError = StoreError::InvalidArgument("bad".into()).into();
        let corrupt: ApiError = StoreError::CorruptDocument("detail".into()).into();
        let merge: ApiError = StoreError::MergeFailed("task panicked".into()).into();
        let storage: ApiError = StoreError::Storage(StorageError::unavailable("down")).into();

        assert!(matches!(invalid, ApiError::InvalidArgument(_)));
        assert!(matches!(corrupt, ApiError::CorruptDocument(_)));
        assert!(matches!(merge, ApiError::Internal(_)));
        assert!(matches!(storage, ApiError::StorageUnavailable(_)));

        let (_, envelope) = envelope_of(StoreError::InvalidArgument("bad".into()).into()).await;
        assert_ne!(envelope.code, CODE_OK);
    }
}
