//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder and relay produce:
//!     → logging.rs (structured log events, one span per exchange)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID lives in the span only; it is never added to forwarded headers
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
