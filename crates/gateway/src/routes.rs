//! One handler per automation operation.
//!
//! Parameter validation happens here, before any session is touched: a blank
//! path parameter or a missing body field short-circuits with the parameter
//! envelope and never provisions a browser. Body parsing is deliberately
//! tolerant, an absent or non-JSON body just means every field is missing.

use std::sync::Arc;

use {
    axum::{
        Extension, Json,
        body::Bytes,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    secrecy::{ExposeSecret, SecretString},
    serde_json::{Value, json},
    warble_browser::SessionHandle,
};

use crate::{
    auth_middleware::ApiKey,
    envelope::{envelope, missing_param, missing_params, provisioning_error},
    state::AppState,
};

// ── Body parsing ────────────────────────────────────────────────────────────

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn parse_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn body_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !is_blank(s))
        .map(str::to_owned)
}

fn body_str_list(value: &Value, field: &str) -> Option<Vec<String>> {
    let items = value.get(field)?.as_array()?;
    let list: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !is_blank(s))
        .map(str::to_owned)
        .collect();
    if list.is_empty() { None } else { Some(list) }
}

struct Credentials {
    username: String,
    password: SecretString,
}

fn parse_credentials(value: &Value) -> Option<Credentials> {
    let username = body_str(value, "username")?;
    let password = body_str(value, "password")?;
    Some(Credentials {
        username,
        password: SecretString::new(password),
    })
}

async fn session_for(state: &AppState, key: &str) -> Result<Arc<SessionHandle>, Response> {
    state
        .sessions
        .resolve(key)
        .await
        .map_err(|err| provisioning_error(&err).into_response())
}

// ── Public routes ───────────────────────────────────────────────────────────

pub async fn banner() -> &'static str {
    "warble: social automation service"
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn create_key(State(state): State<AppState>) -> impl IntoResponse {
    let key = state.keys.create_key();
    (StatusCode::OK, Json(json!({ "data": { "key": key } })))
}

// ── Session routes ──────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    body: Bytes,
) -> Response {
    let value = parse_json(&body);
    let Some(credentials) = parse_credentials(&value) else {
        return missing_params("username or password").into_response();
    };

    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let mut guard = handle.lock().await;
    let outcome = guard
        .session
        .login(&credentials.username, credentials.password.expose_secret())
        .await;
    envelope(outcome).into_response()
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Response {
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let mut guard = handle.lock().await;
    envelope(guard.session.logout().await).into_response()
}

// ── Profile routes ──────────────────────────────────────────────────────────

pub async fn follow(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().follow(&username).await).into_response()
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().unfollow(&username).await).into_response()
}

pub async fn tweet(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    body: Bytes,
) -> Response {
    let value = parse_json(&body);
    let Some(text) = body_str(&value, "text") else {
        return missing_param("text").into_response();
    };
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().tweet(&text).await).into_response()
}

pub async fn like_tweet(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path((username, id)): Path<(String, String)>,
) -> Response {
    if is_blank(&username) || is_blank(&id) {
        return missing_params("username or status id").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().like(&id, &username).await).into_response()
}

pub async fn like_last_tweet(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().like_last_tweet(&username).await).into_response()
}

pub async fn like_recent_tweets(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().like_recent_tweets(&username).await).into_response()
}

pub async fn retweet(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path((username, id)): Path<(String, String)>,
) -> Response {
    if is_blank(&username) || is_blank(&id) {
        return missing_params("username or status id").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().retweet(&id, &username).await).into_response()
}

pub async fn retweet_last(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().retweet_last_tweet(&username).await).into_response()
}

pub async fn follow_network_user(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().follow_network(Some(&username)).await).into_response()
}

pub async fn follow_network_own(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Response {
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    let Some(username) = guard.session.username().map(str::to_owned) else {
        return missing_param("username").into_response();
    };
    envelope(guard.session.profile().follow_network(Some(&username)).await).into_response()
}

pub async fn follow_interests(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().follow_interests(&username).await).into_response()
}

pub async fn followers_of(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().followers(Some(&username)).await).into_response()
}

pub async fn followers_own(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Response {
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    let Some(username) = guard.session.username().map(str::to_owned) else {
        return missing_param("username").into_response();
    };
    envelope(guard.session.profile().followers(Some(&username)).await).into_response()
}

pub async fn interests_of(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(username): Path<String>,
) -> Response {
    if is_blank(&username) {
        return missing_param("username").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.profile().interests(Some(&username)).await).into_response()
}

pub async fn interests_own(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Response {
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    let Some(username) = guard.session.username().map(str::to_owned) else {
        return missing_param("username").into_response();
    };
    envelope(guard.session.profile().interests(Some(&username)).await).into_response()
}

// ── Direct-message routes ───────────────────────────────────────────────────

pub async fn dm_list(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Response {
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.messaging().list().await).into_response()
}

pub async fn dm_create(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    body: Bytes,
) -> Response {
    let value = parse_json(&body);
    let Some(text) = body_str(&value, "text") else {
        return missing_param("text").into_response();
    };
    let Some(usernames) = body_str_list(&value, "usernames") else {
        return missing_param("usernames").into_response();
    };
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.messaging().create(&text, &usernames).await).into_response()
}

pub async fn dm_reply(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(thread_id): Path<String>,
    body: Bytes,
) -> Response {
    if is_blank(&thread_id) {
        return missing_param("thread id").into_response();
    }
    let value = parse_json(&body);
    let Some(text) = body_str(&value, "text") else {
        return missing_param("text").into_response();
    };
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.messaging().reply(&text, &thread_id).await).into_response()
}

pub async fn dm_messages(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(thread_id): Path<String>,
) -> Response {
    if is_blank(&thread_id) {
        return missing_param("thread id").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.messaging().messages(&thread_id).await).into_response()
}

pub async fn dm_delete(
    State(state): State<AppState>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    Path(thread_id): Path<String>,
) -> Response {
    if is_blank(&thread_id) {
        return missing_param("thread id").into_response();
    }
    let handle = match session_for(&state, &key).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };
    let guard = handle.lock().await;
    envelope(guard.session.messaging().delete(&thread_id).await).into_response()
}

// ── Key management ──────────────────────────────────────────────────────────

pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Response {
    if is_blank(&key) {
        return missing_param("key").into_response();
    }
    let deleted = state.keys.delete_key(&key);
    // Tear down any session riding on the key, whether or not the store knew it.
    state.sessions.revoke(&key).await;
    (
        StatusCode::OK,
        Json(json!({ "data": { "key": key, "deleted": deleted } })),
    )
        .into_response()
}
