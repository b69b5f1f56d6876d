//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Default origin and override header.
    pub target: TargetConfig,

    /// Response relay settings.
    pub relay: RelayConfig,

    /// Outbound client settings.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address built from `bind_address` and `port`.
    ///
    /// Returns `None` if the bind address is not an IP literal; validation
    /// rejects such configs before startup.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().ok()?;
        Some(SocketAddr::new(ip, self.port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 10240,
        }
    }
}

/// Target resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    /// Default origin (scheme + host, optional base path).
    pub default: String,

    /// Header whose non-empty value replaces the default host.
    pub override_header: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            default: "https://api.openai.com".to_string(),
            override_header: "x-target-host".to_string(),
        }
    }
}

/// Response relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Largest body frame handed to the caller, in bytes.
    pub chunk_size: usize,

    /// Remove hop-by-hop headers in both directions.
    pub strip_hop_by_hop: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16 * 1024,
            strip_hop_by_hop: false,
        }
    }
}

/// Outbound client configuration.
///
/// There are deliberately no timeout knobs here: the caller and the origin
/// own timeout policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Offer HTTP/2 via ALPN on TLS connections.
    pub http2: bool,

    /// Maximum idle pooled connections kept per origin host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http2: true,
            pool_max_idle_per_host: 32,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Log every resolved target URL at info level.
    pub log_target_urls: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_target_urls: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
