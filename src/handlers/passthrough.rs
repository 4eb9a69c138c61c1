//! Raw-record handlers that bypass the dictionary document and talk to the
//! storage backend one key at a time.

use crate::error::ApiError;
use crate::models::{DeleteRecordQuery, Envelope, PutRecordQuery};
use crate::routes;
use crate::state::AppState;
use crate::store::Document;
use axum::extract::rejection::QueryRejection;
use axum::{extract::Query, extract::State, http::StatusCode, Json};
use bytes::Bytes;
use serde_json::{json, Value as JsonValue};

/// GET /put handler - Store one raw record
///
/// Accepts GET or POST; both key and value arrive as query parameters and
/// the value is stored verbatim as the record body.
#[utoipa::path(
    get,
    path = routes::PUT_RECORD,
    params(
        ("key" = Option<String>, Query, description = "Record key, required"),
        ("value" = Option<String>, Query, description = "Record value, required, stored verbatim")
    ),
    responses(
        (status = 200, description = "Record stored; data echoes the pair", body = Envelope),
        (status = 400, description = "Missing key or value", body = Envelope),
        (status = 500, description = "Storage failure", body = Envelope)
    ),
    tag = "records"
)]
pub async fn put_record_handler(
    State(state): State<AppState>,
    query: Result<Query<PutRecordQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::InvalidArgument(rejection.body_text()))?;

    let (key, value) = match (query.key, query.value) {
        (Some(key), Some(value)) if !key.is_empty() => (key, value),
        _ => {
            return Err(ApiError::InvalidArgument(
                "query parameters 'key' and 'value' are both required".to_string(),
            ))
        }
    };

    state.storage.put(&key, Bytes::from(value.clone())).await?;

    tracing::info!("Stored raw record under key: {}", key);
    let mut echo = Document::new();
    echo.insert(key, JsonValue::String(value));
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("record saved", JsonValue::Object(echo))),
    ))
}

/// GET /list handler - List every key in the storage namespace
///
/// Returns raw backend keys, so the dictionary document key shows up here
/// alongside any records written through /put.
#[utoipa::path(
    get,
    path = routes::LIST_RECORDS,
    responses(
        (status = 200, description = "All keys in the namespace", body = Envelope),
        (status = 500, description = "Storage failure", body = Envelope)
    ),
    tag = "records"
)]
pub async fn list_records_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let keys = state.storage.list().await?;

    tracing::info!("Listed {} keys", keys.len());
    Ok((StatusCode::OK, Json(Envelope::ok("ok", json!(keys)))))
}

/// DELETE /delete handler - Remove one raw record
///
/// The DELETE-method twin of POST /delete; takes the key from the query
/// string and removes the record itself rather than a dictionary entry.
#[utoipa::path(
    delete,
    path = routes::DELETE_ENTRY,
    params(
        ("key" = Option<String>, Query, description = "Record key, required")
    ),
    responses(
        (status = 200, description = "Record removed", body = Envelope),
        (status = 400, description = "Missing key", body = Envelope),
        (status = 500, description = "Storage failure", body = Envelope)
    ),
    tag = "records"
)]
pub async fn delete_record_handler(
    State(state): State<AppState>,
    query: Result<Query<DeleteRecordQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::InvalidArgument(rejection.body_text()))?;

    let key = match query.key {
        Some(key) if !key.is_empty() => key,
        _ => {
            return Err(ApiError::InvalidArgument(
                "query parameter 'key' is required".to_string(),
            ))
        }
    };

    state.storage.delete(&key).await?;

    tracing::info!("Deleted raw record under key: {}", key);
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("record deleted", JsonValue::Null)),
    ))
}
