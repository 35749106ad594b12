use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use inference_gateway::config::{load_config, ConfigOverrides};
use inference_gateway::observability::{logging, metrics};
use inference_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "inference-gateway")]
#[command(about = "Authenticated streaming gateway for a local inference server", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Backend base URL, e.g. http://localhost:11434.
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Refuses to start without an API key.
    let config = load_config(
        cli.config.as_deref(),
        &ConfigOverrides {
            bind_address: cli.bind,
            backend_url: cli.backend_url,
        },
    )?;

    logging::init_logging(config.observability.log_format);

    tracing::info!("inference-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        open_mode = config.auth.allowed_ips.is_empty(),
        connect_timeout_secs = config.backend.connect_timeout_secs,
        response_timeout_secs = config.backend.response_timeout_secs,
        idle_timeout_secs = config.backend.idle_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
