//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight exchanges drain → exit
//! ```
//!
//! # Design Decisions
//! - In-flight streams are allowed to finish; there is no drain deadline,
//!   since the proxy does not own timeouts

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
