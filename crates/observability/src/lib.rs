//! Tracing and logging setup shared by binaries and tests.

pub mod config;
pub mod tracing;

pub use config::{LogFormat, LogFormatError, ObservabilityConfig};

/// Initialize process-wide observability from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    init_with(&ObservabilityConfig::from_env());
}

/// Initialize process-wide observability from an explicit config.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init(config);
}
