//! The request-forwarding path.
//!
//! Each exchange moves through a fixed sequence of phases and never goes
//! back:
//!
//! ```text
//! Validating → Resolving → Building → Sending → RelayingHeaders → RelayingBody → Done
//!      └────────────┴──────────┴──────────┴─────────────┴──────────────┴────→ Failed
//! ```
//!
//! Failures are terminal for the exchange. There is no retry at any phase,
//! and no timeout: the caller and the origin decide how long to wait.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::OnceLock;

use crate::config::{ClientConfig, ForwarderConfig, RelayConfig};
use crate::error::{Error, ForwardError, Phase};
use crate::http::headers::{copy_request_headers, copy_response_headers};
use crate::http::relay::RelayBody;
use crate::http::target::{build_target_url, parse_target, InboundTarget, TargetResolver};

/// Pooled HTTP/HTTPS client used for every origin.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Forwards inbound requests to the resolved origin and relays the answer.
///
/// Immutable after construction and shared across all exchanges.
pub struct Forwarder {
    client: UpstreamClient,
    resolver: TargetResolver,
    relay: RelayConfig,
    log_target_urls: bool,
}

impl Forwarder {
    pub fn new(config: &ForwarderConfig) -> Result<Self, Error> {
        let resolver = TargetResolver::new(&config.target)?;
        let client = build_client(&config.client);

        tracing::info!(
            default_target = %resolver.default_target(),
            override_header = %resolver.override_header(),
            chunk_size = config.relay.chunk_size,
            strip_hop_by_hop = config.relay.strip_hop_by_hop,
            "Forwarder ready"
        );

        Ok(Self {
            client,
            resolver,
            relay: config.relay.clone(),
            log_target_urls: config.observability.log_target_urls,
        })
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    /// Forward one request.
    ///
    /// On success the returned response carries the origin's status and
    /// headers, and a body that streams from the origin as it is polled.
    pub async fn handle(
        &self,
        request: Request<Body>,
        request_id: &str,
    ) -> Result<Response, ForwardError> {
        let mut phase = Phase::Validating;
        let result = self.forward(request, request_id, &mut phase).await;
        if let Err(err) = &result {
            tracing::warn!(
                phase = %phase,
                kind = err.kind(),
                error = %err,
                "Forwarding failed"
            );
        }
        result
    }

    async fn forward(
        &self,
        request: Request<Body>,
        request_id: &str,
        phase: &mut Phase,
    ) -> Result<Response, ForwardError> {
        let (parts, body) = request.into_parts();
        let inbound = InboundTarget::from_uri(&parts.uri)?;

        *phase = Phase::Resolving;
        let origin = self.resolver.resolve(&parts.headers)?;

        *phase = Phase::Building;
        let target = parse_target(&build_target_url(&origin.base(), inbound))?;
        if self.log_target_urls {
            tracing::info!(url = %target, overridden = origin.is_override(), "Proxying request");
        } else {
            tracing::debug!(url = %target, overridden = origin.is_override(), "Proxying request");
        }

        let mut builder = Request::builder().method(parts.method.clone()).uri(target);
        if let Some(headers) = builder.headers_mut() {
            copy_request_headers(&parts.headers, headers, self.relay.strip_hop_by_hop);
        }
        let outbound = builder
            .body(body)
            .map_err(|e| ForwardError::OutboundRequest(e.to_string()))?;

        *phase = Phase::Sending;
        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| ForwardError::transport(&e))?;

        *phase = Phase::RelayingHeaders;
        let (head, incoming) = response.into_parts();
        let body = RelayBody::new(incoming, self.relay.chunk_size, request_id);
        let mut relayed = Response::new(Body::new(body));
        *relayed.status_mut() = head.status;
        copy_response_headers(&head.headers, relayed.headers_mut(), self.relay.strip_hop_by_hop);

        tracing::debug!(status = head.status.as_u16(), "Origin responded");

        *phase = Phase::RelayingBody;
        Ok(relayed)
    }
}

/// Build the upstream client. No connect, request or read timeouts are set.
pub fn build_client(config: &ClientConfig) -> UpstreamClient {
    install_crypto_provider();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);

    let roots = match HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "No usable native root certificates, using bundled webpki roots");
            HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };

    let connector = if config.http2 {
        roots
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http)
    } else {
        roots.https_or_http().enable_http1().wrap_connector(http)
    };

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(connector)
}

fn install_crypto_provider() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider already installed");
        }
    });
}
