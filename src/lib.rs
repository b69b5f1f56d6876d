//! Streaming HTTP forwarding proxy.
//!
//! Accepts any request, picks an origin (the `X-Target-Host` header or the
//! configured default), forwards method, headers and body unchanged, and
//! streams the origin's status, headers and body back as they arrive.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ForwarderConfig;
pub use error::{Error, ForwardError};
pub use http::{Forwarder, HttpServer};
pub use lifecycle::Shutdown;
