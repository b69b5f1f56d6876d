//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum catch-all, request span)
//!     → forwarder.rs (validate, resolve, build, send)
//!         → target.rs (override header vs default target, URL join)
//!         → headers.rs (additive header copy)
//!     → relay.rs (stream origin body back in bounded frames)
//!     → caller
//! ```

pub mod forwarder;
pub mod headers;
pub mod relay;
pub mod server;
pub mod target;

pub use forwarder::Forwarder;
pub use server::HttpServer;
