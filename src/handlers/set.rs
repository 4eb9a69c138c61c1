use crate::error::ApiError;
use crate::models::{Envelope, SetEntryRequest};
use crate::routes;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value as JsonValue;

/// POST /set handler - Insert or overwrite one dictionary entry
///
/// The body must be `{"key": <string>, "value": <any JSON value>}`. An
/// explicit `null` value is stored as-is; omitting `value` is rejected.
/// `data` in the response carries the dictionary after the merge.
#[utoipa::path(
    post,
    path = routes::SET_ENTRY,
    request_body = SetEntryRequest,
    responses(
        (status = 200, description = "Entry stored; data is the merged dictionary", body = Envelope),
        (status = 400, description = "Malformed body or failed validation", body = Envelope),
        (status = 500, description = "Storage failure or corrupt document", body = Envelope)
    ),
    tag = "dict"
)]
pub async fn set_entry_handler(
    State(state): State<AppState>,
    body: Result<Json<SetEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::InvalidArgument(rejection.body_text()))?;

    let value = request.value.ok_or_else(|| {
        ApiError::InvalidArgument(
            "field 'value' is required; send an explicit JSON value (null is allowed)".to_string(),
        )
    })?;

    let document = state.store.set_entry(&request.key, value).await?;

    tracing::info!("Stored dictionary entry under key: {}", request.key);
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("entry saved", JsonValue::Object(document))),
    ))
}
