//! Command line flags.
//!
//! Flags layer on top of the config file, which layers on top of the
//! built-in defaults.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{ForwarderConfig, LogFormat};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Streaming HTTP forwarding proxy with per-request host override", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "FORWARD_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// The target domain to proxy (scheme + host).
    #[arg(short, long)]
    pub domain: Option<String>,

    /// The proxy port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Deployment environment; `local` logs every proxied URL.
    #[arg(long = "env", env = "ENV", hide = true)]
    pub environment: Option<String>,
}

/// Long flags that are also accepted with a single dash.
const SINGLE_DASH_FLAGS: [&str; 2] = ["domain", "port"];

impl Cli {
    /// Parse the process arguments, accepting `-domain`/`-port` as well as
    /// `--domain`/`--port`.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Resolve the effective configuration.
    pub fn into_config(self) -> Result<ForwarderConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => ForwarderConfig::default(),
        };
        let config = self.apply(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Apply flag overrides onto a configuration.
    pub fn apply(self, mut config: ForwarderConfig) -> ForwarderConfig {
        if let Some(domain) = self.domain {
            config.target.default = domain;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if self.environment.as_deref() == Some("local") {
            config.observability.log_target_urls = true;
        }
        config
    }
}

/// Rewrite `-domain x` and `-port=n` style arguments to their `--` form.
/// clap would otherwise read `-domain` as `-d omain`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(s) if is_single_dash_long(s) => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(flag) = arg.strip_prefix('-') else {
        return false;
    };
    if flag.starts_with('-') {
        return false;
    }
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    SINGLE_DASH_FLAGS.contains(&name)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format {other:?} (expected pretty or json)")),
    }
}
