//! Gateway: the HTTP surface over browser sessions.
//!
//! Lifecycle:
//! 1. Load + validate config
//! 2. Seed the API key store, create the session registry
//! 3. Start the HTTP server
//! 4. Provision a browser lazily on each key's first authenticated request
//!
//! All page-driving logic lives in `warble-browser`; handlers here only
//! validate parameters, resolve the caller's session and wrap outcomes in the
//! response envelope.

pub mod auth_middleware;
pub mod envelope;
pub mod routes;
pub mod server;
pub mod state;

pub use {
    server::{build_app, start_server},
    state::AppState,
};
