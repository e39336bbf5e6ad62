//! Seer server entry point.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seer_ext_memory::MemoryStore;
use seer_server::{Config, Server, UnavailableProvider};

#[derive(Parser, Debug)]
#[command(name = "seer-server", version, about = "ShareSeer tool-calling API server")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/seer.toml")]
    config: String,

    /// Override the configured listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase log verbosity (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "debug,seer=trace".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,seer=debug".into())
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(default_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Seer Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading configuration from {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Using default configuration");
        Config::default()
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Accounts and quota counters live in the key-value store. The
    // in-memory backend serves single-process deployments; a shared
    // backend slots in behind the same trait.
    let store = Arc::new(MemoryStore::new());

    let server = Server::new(config, store, Arc::new(UnavailableProvider));
    server.start().await?;

    Ok(())
}
