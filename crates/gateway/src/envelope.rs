//! The uniform response envelopes every route answers with.
//!
//! Action results ride in `{"data": …}`; wrapped failures keep HTTP 500 but
//! stay inside the same `data` shape. Parameter errors are reported with
//! HTTP 200 and an error status in the body, which is what existing clients
//! of this API expect.

use {
    axum::{Json, http::StatusCode},
    serde_json::{Value, json},
    warble_browser::Outcome,
};

/// Wrap an action outcome.
pub fn envelope(outcome: Outcome) -> (StatusCode, Json<Value>) {
    match outcome {
        Outcome::Success(value) => (StatusCode::OK, Json(json!({ "data": value }))),
        Outcome::Failure(failure) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "data": { "name": failure.name, "message": failure.message } })),
        ),
    }
}

/// One required parameter is absent or blank.
pub fn missing_param(name: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "data": { "status": "error", "message": format!("missing a parameter: {name}") }
        })),
    )
}

/// A pair of required parameters, at least one absent or blank. The caller
/// passes the combined description, e.g. `"username or password"`.
pub fn missing_params(names: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "data": { "status": "error", "message": format!("missing a parameters: {names}") }
        })),
    )
}

/// Bearer key absent or unknown.
pub fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "status": 401,
            "name": "Unauthorized",
            "message": "Authorization Required",
        })),
    )
}

/// Session provisioning failed; there is no session to attribute this to, so
/// it surfaces as a plain error body.
pub fn provisioning_error(err: &warble_browser::BrowserError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}
