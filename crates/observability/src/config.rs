//! Observability configuration, read from the environment.
//!
//! - `RUST_LOG`: `EnvFilter` directives (default `info`)
//! - `STRATA_LOG_FORMAT`: `json` (default) or `pretty`

use core::str::FromStr;

use thiserror::Error;

pub const FILTER_VAR: &str = "RUST_LOG";
pub const FORMAT_VAR: &str = "STRATA_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown log format '{0}' (expected json or pretty)")]
pub struct LogFormatError(String);

impl FromStr for LogFormat {
    type Err = LogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(LogFormatError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    filter: String,
    format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER, LogFormat::default())
    }
}

impl ObservabilityConfig {
    pub fn new(filter: impl Into<String>, format: LogFormat) -> Self {
        Self {
            filter: filter.into(),
            format,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// Unset or blank values use the defaults; an unrecognised format falls back to
    /// JSON.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup(FILTER_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = lookup(FORMAT_VAR)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        Self { filter, format }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }
}
