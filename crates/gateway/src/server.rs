//! Router assembly and HTTP startup.

use std::net::SocketAddr;

use {
    axum::{
        Router, middleware,
        routing::{delete, get, post},
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use warble_config::WarbleConfig;

use crate::{auth_middleware::require_auth, routes, state::AppState};

/// Build the full router (shared between production startup and tests).
///
/// Route order matters less than it looks: the static `/messages` prefix wins
/// over the `/{username}` wildcard, so `GET /messages/1` is a thread fetch and
/// `GET /bob/interests` is a profile list.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/", get(routes::banner))
        .route("/health", get(routes::health))
        .route("/keys", post(routes::create_key));

    let protected = Router::new()
        .route("/login", post(routes::login))
        .route("/logout", get(routes::logout))
        .route("/follow/{username}", post(routes::follow))
        .route("/unfollow/{username}", post(routes::unfollow))
        .route("/tweet", post(routes::tweet))
        .route("/like-tweet/{username}/status/{id}", post(routes::like_tweet))
        .route("/like-last-tweet/{username}", post(routes::like_last_tweet))
        .route(
            "/like-recent-tweets/{username}",
            post(routes::like_recent_tweets),
        )
        .route("/retweet/{username}/status/{id}", post(routes::retweet))
        .route("/retweet-last/{username}", post(routes::retweet_last))
        .route("/follow-network", post(routes::follow_network_own))
        .route("/follow-network/{username}", post(routes::follow_network_user))
        .route("/follow-interests/{username}", post(routes::follow_interests))
        .route("/followers", get(routes::followers_own))
        .route("/{username}/followers", get(routes::followers_of))
        .route("/interests", get(routes::interests_own))
        .route("/{username}/interests", get(routes::interests_of))
        .route("/messages", get(routes::dm_list).post(routes::dm_create))
        .route(
            "/messages/{thread_id}",
            get(routes::dm_messages).delete(routes::dm_delete),
        )
        .route("/messages/{thread_id}/reply", post(routes::dm_reply))
        .route("/keys/{key}", delete(routes::delete_key))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).layer(cors).with_state(state)
}

/// Start the HTTP server and run until the process is stopped.
pub async fn start_server(
    bind: &str,
    port: u16,
    state: AppState,
    config: &WarbleConfig,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let mode = if config.browser.headless {
        "headless"
    } else {
        "headed"
    };
    let lines = vec![
        format!("warble gateway v{}", env!("CARGO_PKG_VERSION")),
        format!("listening on http://{addr}"),
        format!("target: {}", config.browser.base_url),
        format!(
            "sessions: up to {} concurrent, {mode} browsers",
            config.browser.max_sessions
        ),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}
