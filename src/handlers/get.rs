use crate::error::ApiError;
use crate::models::{DictQuery, Envelope};
use crate::routes;
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::{extract::Query, extract::State, http::StatusCode, Json};
use serde_json::Value as JsonValue;

/// GET /get handler - Read the dictionary, or one raw record
///
/// Without a query string the whole dictionary document is returned in
/// `data`. With `?key=...` the dictionary is bypassed and the raw record
/// stored under that key is returned instead, as a string, or `null` when
/// no such record exists.
#[utoipa::path(
    get,
    path = routes::GET_DICT,
    params(
        ("key" = Option<String>, Query, description = "Read one raw record instead of the dictionary")
    ),
    responses(
        (status = 200, description = "Dictionary contents or record value", body = Envelope),
        (status = 400, description = "Invalid query string", body = Envelope),
        (status = 500, description = "Storage failure or corrupt document", body = Envelope)
    ),
    tag = "dict"
)]
pub async fn get_dict_handler(
    State(state): State<AppState>,
    query: Result<Query<DictQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::InvalidArgument(rejection.body_text()))?;

    match query.key {
        Some(key) => read_record(&state, &key).await,
        None => {
            let document = state.store.read_all().await?;
            tracing::info!("Read dictionary with {} entries", document.len());
            Ok((
                StatusCode::OK,
                Json(Envelope::ok("ok", JsonValue::Object(document))),
            ))
        }
    }
}

/// Raw-record read for the `?key=` form.
async fn read_record(
    state: &AppState,
    key: &str,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    if key.is_empty() {
        return Err(ApiError::InvalidArgument(
            "query parameter 'key' must not be empty".to_string(),
        ));
    }

    let data = match state.storage.get(key).await? {
        Some(bytes) => JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()),
        None => JsonValue::Null,
    };

    tracing::info!("Read raw record under key: {}", key);
    Ok((StatusCode::OK, Json(Envelope::ok("ok", data))))
}
