//! Link-rewriting forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 REWRITE PROXY                     │
//!  GET /{target}      │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!  ───────────────────┼─▶│ context │──▶│ headers  │──▶│   upstream   │───┼──▶ Intermediary
//!                     │  │ extract │   │ outbound │   │   fetcher    │   │      fetcher
//!                     │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                     │                                      ▼           │
//!                     │  ┌──────────┐   ┌──────────┐   ┌──────────────┐  │
//!  ◀──────────────────┼──│ rewrite  │◀──│ dispatch │◀──│   headers    │◀─┼───
//!  rewritten response │  │ html/css │   │  router  │   │  sanitize    │  │
//!                     │  └──────────┘   └──────────┘   └──────────────┘  │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use rewrite_proxy::observability::{init_logging, metrics};
use rewrite_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forward proxy that rewrites links in HTML and CSS to point back through itself", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the intermediary fetcher endpoint.
    #[arg(short, long)]
    fetcher: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(fetcher) = &self.fetcher {
            config.fetcher.endpoint = fetcher.clone();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rewrite-proxy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        fetcher = %config.fetcher.endpoint,
        mode = ?config.fetcher.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
