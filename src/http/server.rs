//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (tracing)
//! - Bind server to listener with graceful shutdown
//! - Open one span per exchange with a request ID

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ForwarderConfig;
use crate::error::Error;
use crate::http::forwarder::Forwarder;
use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ForwarderConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ForwarderConfig) -> Result<Self, Error> {
        let forwarder = Arc::new(Forwarder::new(&config)?);
        let router = Self::build_router(forwarder);
        Ok(Self { router, config })
    }

    /// Build the Axum router. Every method and path reaches the forwarder;
    /// targets axum cannot route (`*`) fall through to the same handler so
    /// they are rejected by validation.
    fn build_router(forwarder: Arc<Forwarder>) -> Router {
        Router::new()
            .route("/", any(forward_handler))
            .route("/{*path}", any(forward_handler))
            .fallback(forward_handler)
            .with_state(forwarder)
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            default_target = %self.config.target.default,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: forward and relay, or answer with the failure.
async fn forward_handler(
    State(forwarder): State<Arc<Forwarder>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let span = tracing::info_span!(
        "forward",
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        peer = %peer
    );

    async move {
        match forwarder.handle(request, &request_id).await {
            Ok(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), "relayed", start);
                response
            }
            Err(err) => {
                metrics::record_request(method.as_str(), 500, err.kind(), start);
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
