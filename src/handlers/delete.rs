use crate::error::ApiError;
use crate::models::{DeleteEntryRequest, Envelope};
use crate::routes;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value as JsonValue;

/// POST /delete handler - Remove one dictionary entry
///
/// Deleting a key that is not present still succeeds; the response carries
/// the dictionary either way.
#[utoipa::path(
    post,
    path = routes::DELETE_ENTRY,
    request_body = DeleteEntryRequest,
    responses(
        (status = 200, description = "Entry removed; data is the remaining dictionary", body = Envelope),
        (status = 400, description = "Malformed body or failed validation", body = Envelope),
        (status = 500, description = "Storage failure or corrupt document", body = Envelope)
    ),
    tag = "dict"
)]
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    body: Result<Json<DeleteEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::InvalidArgument(rejection.body_text()))?;

    let document = state.store.delete_entry(&request.key).await?;

    tracing::info!("Deleted dictionary entry under key: {}", request.key);
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("entry deleted", JsonValue::Object(document))),
    ))
}
