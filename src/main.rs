//! httpbun server binary.
//!
//! ```text
//! CLI flags ─┐
//! env vars ──┼─▶ BunConfig ─▶ Mux (routes + auth) ─▶ Axum ─▶ clients
//! TOML file ─┘
//! ```
//!
//! Precedence, lowest first: defaults, `--config` file, `HTTPBUN_*` env, flags.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use httpbun::config::loader::{finalize, load_config};
use httpbun::observability::logging;
use httpbun::{BunConfig, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "httpbun")]
#[command(about = "HTTP request reflection server for testing clients and proxies", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3090.
    #[arg(short, long)]
    bind: Option<String>,

    /// Mount prefix, e.g. /bun.
    #[arg(long)]
    path_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BunConfig::default(),
    }
    .apply_env(|key| std::env::var(key).ok());

    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(prefix) = cli.path_prefix {
        config.routing.path_prefix = prefix;
    }

    let config = finalize(config)?;

    logging::init(&config.observability.log_level);
    tracing::info!("httpbun v{} starting", env!("CARGO_PKG_VERSION"));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
