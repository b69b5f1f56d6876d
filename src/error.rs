//! Error types.
//!
//! `ForwardError` covers a single exchange and always renders as a
//! `500 Internal Server Error`; `Error` covers process startup.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Per-request failure. Every variant is terminal for its exchange.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The inbound request target cannot be turned into a URL path.
    #[error("malformed request URL {0:?}")]
    MalformedUrl(String),

    /// The forwarded request could not be built (bad resolved URL, bad host).
    #[error("error creating proxy request: {0}")]
    OutboundRequest(String),

    /// Sending to the origin failed (DNS, connect, TLS, protocol).
    #[error("{0}")]
    Transport(String),

    /// Reading the origin body failed after the response head was sent.
    #[error("stream relay failed: {0}")]
    Stream(String),
}

/// Request lifecycle phase, recorded on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Resolving,
    Building,
    Sending,
    RelayingHeaders,
    RelayingBody,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::Resolving => "resolving",
            Phase::Building => "building",
            Phase::Sending => "sending",
            Phase::RelayingHeaders => "relaying_headers",
            Phase::RelayingBody => "relaying_body",
        };
        f.write_str(name)
    }
}

impl ForwardError {
    /// Build a transport error whose text includes the whole source chain.
    ///
    /// hyper-util's client error only says "client error (Connect)"; the
    /// useful part (refused, DNS, certificate) lives in its sources.
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        ForwardError::Transport(error_chain(err))
    }

    /// Metrics label for the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::MalformedUrl(_) => "malformed_url",
            ForwardError::OutboundRequest(_) => "outbound_request",
            ForwardError::Transport(_) => "transport",
            ForwardError::Stream(_) => "stream",
        }
    }

    /// Text written to the caller. Only transport errors expose details.
    fn body(&self) -> String {
        match self {
            ForwardError::MalformedUrl(_) => StatusCode::INTERNAL_SERVER_ERROR
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            ForwardError::OutboundRequest(_) => "Error creating proxy request".to_string(),
            ForwardError::Transport(message) | ForwardError::Stream(message) => message.clone(),
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, self.body()).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

/// Startup failure. Any of these ends the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // hyper repeats the cause in some Display impls
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
