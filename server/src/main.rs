//! Server entrypoint: parse CLI args, load config, serve.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use railbird_server::config::Config;
use railbird_server::server::{run_server, AppState};

#[derive(Parser, Debug, Clone)]
#[command(name = "railbird-server", version, about = "Texas Hold'em table server")]
struct ServerCli {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(long, default_value = "railbird.toml")]
    config: PathBuf,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,

    /// Enable verbose debug logging
    #[arg(long, short, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ServerCli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::load_or_create(&cli.config)
        .with_context(|| format!("loading or creating config '{}'", cli.config.display()))?;
    let port = cli.port.unwrap_or(config.port);

    tracing::info!(config = %cli.config.display(), port, "starting railbird server");

    let state = AppState::new(config);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    run_server(addr, state).await
}
