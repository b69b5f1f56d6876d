//! Target URL resolution.
//!
//! Precedence is strict: a non-empty override header always wins over the
//! configured default, and the two are never merged.
//!
//! ```text
//! X-Target-Host: api.anthropic.com   →  https://api.anthropic.com<path>[?query]
//! (absent or empty)                  →  <default target><path>[?query]
//! ```

use axum::http::uri::InvalidUri;
use axum::http::{HeaderMap, HeaderName, Uri};
use std::borrow::Cow;

use crate::config::validation::{normalize_default_target, ValidationError};
use crate::config::{ConfigError, TargetConfig};
use crate::error::ForwardError;

/// Scheme given to override hosts. The override header carries a bare host.
pub const OVERRIDE_SCHEME: &str = "https";

/// The path and raw query of a validated inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundTarget<'a> {
    pub path: &'a str,
    /// Raw query, never empty when present.
    pub query: Option<&'a str>,
}

impl<'a> InboundTarget<'a> {
    /// Extract the origin-form path and query.
    ///
    /// Asterisk-form (`OPTIONS *`) and authority-form (`CONNECT host:443`)
    /// targets have no path to forward and are rejected.
    pub fn from_uri(uri: &'a Uri) -> Result<Self, ForwardError> {
        let path = uri.path();
        if !path.starts_with('/') {
            return Err(ForwardError::MalformedUrl(uri.to_string()));
        }
        Ok(Self {
            path,
            query: uri.query().filter(|q| !q.is_empty()),
        })
    }
}

/// Where a request is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin<'a> {
    /// The process-wide default target.
    Default(&'a str),
    /// Host named by the override header.
    Override(&'a str),
}

impl Origin<'_> {
    /// Scheme and authority (plus base path for the default target).
    pub fn base(&self) -> Cow<'_, str> {
        match self {
            Origin::Default(base) => Cow::Borrowed(*base),
            Origin::Override(host) => Cow::Owned(format!("{OVERRIDE_SCHEME}://{host}")),
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, Origin::Override(_))
    }
}

/// Resolves inbound requests to target URLs.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    default: String,
    override_header: HeaderName,
}

impl TargetResolver {
    /// Build from validated configuration.
    pub fn new(config: &TargetConfig) -> Result<Self, ConfigError> {
        let override_header = HeaderName::from_bytes(config.override_header.as_bytes())
            .map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidOverrideHeader(
                    config.override_header.clone(),
                )])
            })?;
        Ok(Self {
            default: normalize_default_target(&config.default).to_string(),
            override_header,
        })
    }

    pub fn default_target(&self) -> &str {
        &self.default
    }

    pub fn override_header(&self) -> &HeaderName {
        &self.override_header
    }

    /// Pick the origin for a request.
    pub fn resolve<'a>(&'a self, headers: &'a HeaderMap) -> Result<Origin<'a>, ForwardError> {
        match headers.get(&self.override_header) {
            Some(value) if !value.is_empty() => {
                let host = value.to_str().map_err(|_| {
                    ForwardError::OutboundRequest(format!(
                        "{} is not a valid host",
                        self.override_header
                    ))
                })?;
                Ok(Origin::Override(host))
            }
            _ => Ok(Origin::Default(&self.default)),
        }
    }
}

/// `<base><path>[?query]` with the query copied verbatim.
pub fn build_target_url(base: &str, inbound: InboundTarget<'_>) -> String {
    match inbound.query {
        Some(query) => format!("{}{}?{}", base, inbound.path, query),
        None => format!("{}{}", base, inbound.path),
    }
}

/// Parse a built target URL, requiring an absolute URI.
pub fn parse_target(url: &str) -> Result<Uri, ForwardError> {
    let uri: Uri = url
        .parse()
        .map_err(|e: InvalidUri| ForwardError::OutboundRequest(format!("{url}: {e}")))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ForwardError::OutboundRequest(format!("{url}: not an absolute URL")));
    }
    Ok(uri)
}
