use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    warble_auth::ApiKeyStore,
    warble_browser::{SessionRegistry, detect},
    warble_common::redact_key,
    warble_gateway::AppState,
};

#[derive(Parser)]
#[command(name = "warble", about = "Warble — browser-driven social automation API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Explicit config file (overrides discovery).
    #[arg(long, global = true, env = "WARBLE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Run browsers with a visible window instead of headless.
    #[arg(long, global = true, default_value_t = false)]
    visible: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server (default when no subcommand is provided).
    Serve,
    /// Print the resolved config and browser detection result, then exit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Serve) => serve(cli).await,
        Some(Commands::Doctor) => doctor(&cli),
    }
}

async fn serve(cli: Cli) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "warble starting");

    let mut config = warble_config::discover_and_load(cli.config.as_deref())?;

    // CLI args override config values.
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.visible {
        config.browser.headless = false;
    }

    detect::check_and_warn(config.browser.executable.as_deref());

    let keys = Arc::new(ApiKeyStore::new());
    if let Some(ref dev_key) = config.auth.dev_key {
        keys.seed(dev_key);
    }
    let sessions = Arc::new(SessionRegistry::new(config.browser.clone()));
    let state = AppState::new(Arc::clone(&sessions), keys);

    let bind = config.server.bind.clone();
    let port = config.server.port;
    tokio::select! {
        result = warble_gateway::start_server(&bind, port, state, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            sessions.shutdown().await;
            Ok(())
        },
    }
}

fn doctor(cli: &Cli) -> anyhow::Result<()> {
    let config = warble_config::discover_and_load(cli.config.as_deref())?;

    println!("server:   {}:{}", config.server.bind, config.server.port);
    println!("target:   {}", config.browser.base_url);
    println!("headless: {}", config.browser.headless);
    println!("sessions: up to {}", config.browser.max_sessions);
    match config.auth.dev_key {
        Some(ref key) => println!("dev key:  {}", redact_key(key)),
        None => println!("dev key:  none configured"),
    }

    let detection = detect::detect_browser(config.browser.executable.as_deref());
    match detection.path {
        Some(path) => println!("browser:  {}", path.display()),
        None => {
            println!("browser:  none found");
            println!("\n{}", detection.install_hint);
        },
    }
    Ok(())
}
