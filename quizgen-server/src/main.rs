//! Quizgen Server
//!
//! Backend for the quiz generator: authenticates users, validates quiz
//! creation requests before handing them to the External Processor, brokers
//! realtime channel access and proxies speech synthesis.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Quizgen - quiz generation backend
#[derive(Parser, Debug)]
#[command(name = "quizgen-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "QUIZGEN_CONFIG", default_value = "./quizgen-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may live in a .env file during development
    let dotenv = dotenvy::dotenv();

    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting quizgen-server v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {:?}", path);
    }

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let sections = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = sections.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let http = reqwest::Client::builder()
        .user_agent(concat!("quizgen-server/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = AppState::new(sections, http);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quizgen_core=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
