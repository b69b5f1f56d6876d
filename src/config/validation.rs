//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the default target is a usable base URL
//! - Validate value ranges (chunk size > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForwarderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderName;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use url::Url;

use crate::config::schema::ForwarderConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target.default {value:?} is not a valid URL: {reason}")]
    InvalidDefaultTarget { value: String, reason: String },

    #[error("target.override_header {0:?} is not a valid header name")]
    InvalidOverrideHeader(String),

    #[error("listener.bind_address {0:?} is not an IP address")]
    InvalidBindAddress(String),

    #[error("relay.chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(reason) = check_default_target(&config.target.default) {
        errors.push(ValidationError::InvalidDefaultTarget {
            value: config.target.default.clone(),
            reason,
        });
    }

    if HeaderName::from_bytes(config.target.override_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidOverrideHeader(
            config.target.override_header.clone(),
        ));
    }

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.relay.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Strip the trailing slash so `<target><path>` never produces `//`.
pub fn normalize_default_target(target: &str) -> &str {
    target.trim_end_matches('/')
}

fn check_default_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
