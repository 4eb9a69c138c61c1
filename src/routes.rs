use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

// Route path constants - single source of truth for all API paths

pub const GET_DICT: &str = "/get";
pub const GET_DICT_ALIAS: &str = "/getDict";
pub const SET_ENTRY: &str = "/set";
pub const APPEND_ENTRY: &str = "/append";
pub const DELETE_ENTRY: &str = "/delete";
pub const PUT_RECORD: &str = "/put";
pub const LIST_RECORDS: &str = "/list";
pub const HEALTH: &str = "/health";
pub const DOCS: &str = "/docs";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

const CORS_ALLOW_METHODS: &str = "GET,POST,OPTIONS,DELETE";
const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Build the application router.
///
/// One dispatch table covers every operation. The legacy aliases
/// (`/getDict`, `/append`) reuse the handlers of their canonical routes,
/// and anything unmatched, by path or by method, falls through to the
/// route-not-found envelope.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(GET_DICT, get(handlers::get_dict_handler))
        .route(GET_DICT_ALIAS, get(handlers::get_dict_handler))
        .route(SET_ENTRY, post(handlers::set_entry_handler))
        .route(APPEND_ENTRY, post(handlers::set_entry_handler))
        .route(
            DELETE_ENTRY,
            post(handlers::delete_entry_handler).delete(handlers::delete_record_handler),
        )
        .route(
            PUT_RECORD,
            get(handlers::put_record_handler).post(handlers::put_record_handler),
        )
        .route(LIST_RECORDS, get(handlers::list_records_handler))
        .route(HEALTH, get(handlers::health_handler))
        .merge(SwaggerUi::new(DOCS).url(OPENAPI_JSON, ApiDoc::openapi()))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn(cors_headers))
        .layer(TraceLayer::new_for_http())
}

/// Attach the permissive CORS headers to every response.
///
/// Browser preflights are answered right here with 204 and never reach the
/// dispatch table, so an OPTIONS probe succeeds for any path. All other
/// responses, errors included, carry the same three headers.
pub async fn cors_headers(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors(response.headers_mut());
    response
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}

/// Shared fallback for unknown paths and mismatched methods.
async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound(method, uri.path().to_string())
}
