//! forward-proxy binary.
//!
//! ```text
//! forward-proxy --domain https://api.openai.com --port 10240
//! curl -H 'X-Target-Host: api.anthropic.com' localhost:10240/v1/messages
//! ```

use std::net::AddrParseError;
use tokio::net::TcpListener;

use forward_proxy::config::Cli;
use forward_proxy::lifecycle::{signals, Shutdown};
use forward_proxy::observability::{logging, metrics};
use forward_proxy::{Error, HttpServer};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Cli::parse_args().into_config()?;

    logging::init_tracing(&config.observability)?;

    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        target_domain = %config.target.default,
        port = config.listener.port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: AddrParseError| Error::Metrics(e.to_string()))?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config
        .listener
        .socket_addr()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid bind address"))?;
    let listener = TcpListener::bind(bind_address).await?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
