use utoipa::OpenApi;

use crate::error::{HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{DeleteEntryRequest, Envelope, SetEntryRequest};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "cloud-dict API",
        version = "1.0.0",
        description = "A persistent JSON dictionary served over HTTP and stored in an external key-value backend"
    ),
    paths(
        handlers::health::health_handler,
        handlers::get::get_dict_handler,
        handlers::set::set_entry_handler,
        handlers::delete::delete_entry_handler,
        handlers::passthrough::put_record_handler,
        handlers::passthrough::list_records_handler,
        handlers::passthrough::delete_record_handler
    ),
    components(
        schemas(
            Envelope,
            SetEntryRequest,
            DeleteEntryRequest,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "dict", description = "Dictionary operations over the shared document"),
        (name = "records", description = "Raw record operations that bypass the dictionary"),
        (name = "health", description = "Health check operations")
    )
)]
pub struct ApiDoc;
