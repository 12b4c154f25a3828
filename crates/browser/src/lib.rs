//! Managed Chrome/Chromium sessions over CDP, one isolated browser per API
//! key, driving the legacy desktop surface of the target site.
//!
//! # Layout
//!
//! - **registry**: key → session map, browser provisioning and teardown
//! - **session**: login/logout state machine per session
//! - **profile**: follow, tweet, like, retweet, listing scrapes
//! - **dm**: direct-message inbox and conversations
//! - **executor**: navigation, selector waits, clicks, typed input
//! - **filter**: CDP fetch interception dropping heavy resources
//! - **device**: user-agent and viewport profile
//!
//! # Example
//!
//! ```ignore
//! use warble_browser::SessionRegistry;
//!
//! let registry = SessionRegistry::new(config.browser);
//! let handle = registry.resolve(&api_key).await?;
//! let mut guard = handle.lock().await;
//! let outcome = guard.session.login("crooner", "hunter2").await;
//! ```

pub mod detect;
pub mod device;
pub mod dm;
pub mod error;
pub mod executor;
pub mod filter;
pub mod outcome;
pub mod profile;
pub mod registry;
pub mod session;

pub use {
    error::{BrowserError, Result},
    outcome::{ActionFailure, Outcome},
    registry::{SessionHandle, SessionRegistry},
    session::CoreSession,
};
