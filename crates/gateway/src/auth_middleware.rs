//! Bearer-key middleware protecting the automation routes.

use {
    axum::{
        body::Body,
        extract::State,
        http::{Request, header},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    tracing::debug,
    warble_common::redact_key,
};

use crate::{envelope::unauthorized, state::AppState};

/// The validated key, inserted as a request extension for handlers.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

/// Extract the bearer token from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|key| !key.is_empty())
}

/// Reject requests whose bearer key is absent or unknown.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        && let Some(key) = parse_bearer(auth_header)
        && state.keys.is_key_valid(key)
    {
        debug!(key = %redact_key(key), "request authorized");
        let key = key.to_owned();
        request.extensions_mut().insert(ApiKey(key));
        return next.run(request).await;
    }

    unauthorized().into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_bearer_strips_the_scheme() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("abc123"), None);
    }
}
