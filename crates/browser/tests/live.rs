//! Live session tests driving a real Chromium install.
//!
//! Everything here launches actual browser processes, so the tests are
//! ignored by default. Run them with `cargo test -p warble-browser -- --ignored`
//! on a machine with Chrome or Chromium available. The login idempotence test
//! additionally needs `WARBLE_TEST_USERNAME` / `WARBLE_TEST_PASSWORD` for a
//! throwaway account and hits the live site.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use {warble_browser::SessionRegistry, warble_config::BrowserConfig};

fn test_config() -> BrowserConfig {
    BrowserConfig {
        headless: true,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install"]
async fn resolve_reuses_the_same_session() {
    let registry = SessionRegistry::new(test_config());

    let first = registry.resolve("key-alpha").await.unwrap();
    let second = registry.resolve("key-alpha").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.live_sessions(), 1);

    registry.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install"]
async fn distinct_keys_get_distinct_sessions() {
    let registry = SessionRegistry::new(test_config());

    let alpha = registry.resolve("key-alpha").await.unwrap();
    let beta = registry.resolve("key-beta").await.unwrap();
    assert!(!Arc::ptr_eq(&alpha, &beta));
    assert_eq!(registry.live_sessions(), 2);

    assert!(registry.revoke("key-alpha").await);
    assert_eq!(registry.live_sessions(), 1);

    registry.shutdown().await;
    assert_eq!(registry.live_sessions(), 0);
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install"]
async fn session_cap_rejects_the_overflow_key() {
    let config = BrowserConfig {
        max_sessions: 1,
        ..test_config()
    };
    let registry = SessionRegistry::new(config);

    registry.resolve("key-alpha").await.unwrap();
    let err = registry.resolve("key-beta").await.unwrap_err();
    assert_eq!(err.name(), "SessionLimit");

    registry.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install"]
async fn logout_before_login_is_a_no_op() {
    let registry = SessionRegistry::new(test_config());

    let handle = registry.resolve("key-alpha").await.unwrap();
    let mut guard = handle.lock().await;
    let outcome = guard.session.logout().await;

    // Never authenticated: no navigation happens and the page URL stays blank.
    match outcome {
        warble_browser::Outcome::Success(value) => {
            assert_eq!(value["status"], "Not logged in");
            assert!(value["username"].is_null());
        },
        warble_browser::Outcome::Failure(failure) => {
            panic!("expected a success outcome, got {failure:?}")
        },
    }

    drop(guard);
    registry.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install and live credentials"]
async fn second_follow_reports_already_following() {
    let (Ok(username), Ok(password)) = (
        std::env::var("WARBLE_TEST_USERNAME"),
        std::env::var("WARBLE_TEST_PASSWORD"),
    ) else {
        eprintln!("skipping: WARBLE_TEST_USERNAME / WARBLE_TEST_PASSWORD not set");
        return;
    };
    let target = std::env::var("WARBLE_TEST_FOLLOW_TARGET")
        .unwrap_or_else(|_| "twitter".to_owned());

    let registry = SessionRegistry::new(test_config());
    let handle = registry.resolve("key-alpha").await.unwrap();
    let mut guard = handle.lock().await;

    let login = guard.session.login(&username, &password).await;
    assert!(login.is_success(), "login failed: {login:?}");

    let first = guard.session.profile().follow(&target).await;
    assert!(first.is_success(), "first follow failed: {first:?}");

    let second = guard.session.profile().follow(&target).await;
    match second {
        warble_browser::Outcome::Success(value) => {
            assert_eq!(value["status"], "Already following");
        },
        warble_browser::Outcome::Failure(failure) => {
            panic!("expected a soft status, got {failure:?}")
        },
    }

    drop(guard);
    registry.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium install and live credentials"]
async fn second_login_reports_the_stored_session() {
    let (Ok(username), Ok(password)) = (
        std::env::var("WARBLE_TEST_USERNAME"),
        std::env::var("WARBLE_TEST_PASSWORD"),
    ) else {
        eprintln!("skipping: WARBLE_TEST_USERNAME / WARBLE_TEST_PASSWORD not set");
        return;
    };

    let registry = SessionRegistry::new(test_config());
    let handle = registry.resolve("key-alpha").await.unwrap();
    let mut guard = handle.lock().await;

    let first = guard.session.login(&username, &password).await;
    assert!(first.is_success(), "first login failed: {first:?}");

    let second = guard.session.login(&username, &password).await;
    match second {
        warble_browser::Outcome::Success(value) => {
            assert_eq!(value["status"], "Logged from session");
            assert_eq!(value["username"], username.as_str());
        },
        warble_browser::Outcome::Failure(failure) => {
            panic!("expected the stored session, got {failure:?}")
        },
    }

    drop(guard);
    registry.shutdown().await;
}
