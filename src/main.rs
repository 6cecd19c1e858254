//! PanCORS server binary.
//!
//! ```text
//!   Browser ──GET /?url=https://api.example/x──▶ ┌──────────────┐ ──GET /x──▶ api.example
//!                                                │   pancors    │
//!   Browser ◀── response + Access-Control-* ──── └──────────────┘ ◀─────────  response
//! ```
//!
//! Configuration precedence: `--port` > `PORT` > config file > defaults for the
//! listen port; `ALLOW_ORIGIN` / `ALLOW_CREDENTIALS` > config file > defaults
//! for the CORS values.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use pancors::config::loader::{apply_env_overrides, apply_port_override, read_config, ENV_PORT};
use pancors::config::ProxyConfig;
use pancors::observability::{logging, metrics};
use pancors::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "pancors")]
#[command(about = "Reverse proxy that adds CORS headers to any response", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Show version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Port to listen on (overrides PORT environment variable)
    #[arg(long)]
    port: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.version {
        println!("PanCORS version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Validated by HttpServer::new, once the environment has had its say.
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    let env_port = std::env::var(ENV_PORT).ok();
    apply_port_override(&mut config, cli.port.as_deref(), env_port.as_deref());

    logging::init_logging(&config.observability);

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    let config = server.config();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        allow_origin = %config.cors.allow_origin,
        allow_credentials = %config.cors.allow_credentials,
        upstream_timeout_secs = ?config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics endpoint");
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "PanCORS started listening");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
