//! Hides internal failure details from callers in production.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::config::Environment;
use crate::domain::error::{InternalFailure, GENERIC_INTERNAL_MESSAGE};

/// Response mapper for `axum::middleware::map_response_with_state`.
pub async fn redact_internal_errors(
    State(environment): State<Environment>,
    response: Response,
) -> Response {
    if !environment.is_production() || response.extensions().get::<InternalFailure>().is_none() {
        return response;
    }
    let status = response.status();
    (
        status,
        Json(json!({ "success": false, "message": GENERIC_INTERNAL_MESSAGE })),
    )
        .into_response()
}
