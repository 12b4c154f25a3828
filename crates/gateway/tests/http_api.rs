#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the HTTP surface: auth, envelopes, key lifecycle.
//!
//! None of these reach a real browser. The auth middleware and parameter
//! validation both short-circuit before any session would be provisioned, so
//! the suite runs on hosts with no Chromium install.

use std::{net::SocketAddr, sync::Arc};

use serde_json::{Value, json};

use tokio::net::TcpListener;

use {
    warble_auth::ApiKeyStore,
    warble_browser::SessionRegistry,
    warble_gateway::{AppState, build_app},
};

async fn start_server() -> (SocketAddr, Arc<ApiKeyStore>) {
    let keys = Arc::new(ApiKeyStore::new());
    let sessions = Arc::new(SessionRegistry::new(
        warble_config::BrowserConfig::default(),
    ));
    let state = AppState::new(sessions, Arc::clone(&keys));
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, keys)
}

/// The banner and health endpoints answer without a key.
#[tokio::test]
async fn banner_and_health_are_public() {
    let (addr, _keys) = start_server().await;

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "warble: social automation service");

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

/// Requests without a bearer key get the fixed 401 body.
#[tokio::test]
async fn missing_key_is_rejected() {
    let (addr, _keys) = start_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/tweet"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "status": 401, "name": "Unauthorized", "message": "Authorization Required" })
    );

    let resp = client
        .get(format!("http://{addr}/messages"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

/// A key the store never issued is as good as no key.
#[tokio::test]
async fn unknown_key_is_rejected() {
    let (addr, _keys) = start_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/logout"))
        .header("Authorization", "Bearer not-a-real-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

/// `POST /keys` mints a key that opens the protected routes.
#[tokio::test]
async fn minted_keys_open_the_protected_routes() {
    let (addr, _keys) = start_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/keys"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let key = body["data"]["key"].as_str().unwrap().to_owned();
    assert!(!key.is_empty());

    // A blank path parameter fails validation before any browser is touched,
    // which proves the key passed the middleware.
    let resp = client
        .post(format!("http://{addr}/follow/%20"))
        .header("Authorization", format!("Bearer {key}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "data": { "status": "error", "message": "missing a parameter: username" } })
    );
}

/// An operator-seeded key validates like a minted one.
#[tokio::test]
async fn seeded_dev_key_validates() {
    let (addr, keys) = start_server().await;
    keys.seed("41872b21-08aa-4a0b-8623-dc1fac0e1fae");

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/unfollow/%20"))
        .header(
            "Authorization",
            "Bearer 41872b21-08aa-4a0b-8623-dc1fac0e1fae",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "error");
}

/// Login without a body reports both credential fields at once.
#[tokio::test]
async fn login_without_credentials_reports_both_params() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/login"))
        .header("Authorization", format!("Bearer {key}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["message"],
        "missing a parameters: username or password"
    );

    // Same when only one half is present.
    let resp = client
        .post(format!("http://{addr}/login"))
        .header("Authorization", format!("Bearer {key}"))
        .json(&json!({ "username": "warbler" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["message"],
        "missing a parameters: username or password"
    );
}

/// Like and retweet by id name both parameters in one message.
#[tokio::test]
async fn like_requires_username_and_status_id() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    for path in ["like-tweet/%20/status/9", "retweet/%20/status/9"] {
        let resp = client
            .post(format!("http://{addr}/{path}"))
            .header("Authorization", format!("Bearer {key}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body["data"]["message"],
            "missing a parameters: username or status id"
        );
    }
}

/// Body fields are required and blank strings do not count.
#[tokio::test]
async fn tweet_requires_text() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    for body in [json!({}), json!({ "text": "   " })] {
        let resp = client
            .post(format!("http://{addr}/tweet"))
            .header("Authorization", format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["message"], "missing a parameter: text");
    }
}

/// New conversations need at least one non-blank recipient.
#[tokio::test]
async fn message_create_requires_recipients() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    for body in [
        json!({ "text": "hi" }),
        json!({ "text": "hi", "usernames": [] }),
        json!({ "text": "hi", "usernames": [" "] }),
    ] {
        let resp = client
            .post(format!("http://{addr}/messages"))
            .header("Authorization", format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["message"], "missing a parameter: usernames");
    }
}

/// Thread routes reject a blank thread id.
#[tokio::test]
async fn thread_routes_need_a_thread_id() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/messages/%20"))
        .header("Authorization", format!("Bearer {key}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["message"], "missing a parameter: thread id");

    // Reply also needs text once the id is present.
    let resp = client
        .post(format!("http://{addr}/messages/77/reply"))
        .header("Authorization", format!("Bearer {key}"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["message"], "missing a parameter: text");
}

/// Deleting a key revokes access immediately; deleting an unknown key
/// reports `deleted: false`.
#[tokio::test]
async fn key_deletion_revokes_access() {
    let (addr, keys) = start_server().await;
    let key = keys.create_key();

    let client = reqwest::Client::new();
    let resp = client
        .delete(format!("http://{addr}/keys/{key}"))
        .header("Authorization", format!("Bearer {key}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "data": { "key": key, "deleted": true } }));

    // The key died with the request that deleted it.
    let resp = client
        .get(format!("http://{addr}/logout"))
        .header("Authorization", format!("Bearer {key}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Deleting something never issued still answers, just with deleted: false.
    let other = keys.create_key();
    let resp = client
        .delete(format!("http://{addr}/keys/no-such-key"))
        .header("Authorization", format!("Bearer {other}"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "data": { "key": "no-such-key", "deleted": false } })
    );
}
