//! Diagnostic output

use tracing_subscriber::EnvFilter;

use crate::config::{AgentConfig, DEFAULT_LOG_FILTER};

/// Install a stderr subscriber for the agent's diagnostics.
///
/// Later calls, and calls in a process that already has a global
/// subscriber, leave the existing one in place.
pub fn init(config: &AgentConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(target: "anchor::agent", filter = %config.log_filter, "diagnostics enabled");
    }
}
