//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (flag and environment overrides)
//!     → validation.rs (semantic checks)
//!     → ForwarderConfig (validated, immutable)
//!     → captured by the Forwarder for the life of the process
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{
    ClientConfig, ForwarderConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    TargetConfig,
};
