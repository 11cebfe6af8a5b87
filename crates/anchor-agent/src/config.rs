//! Agent configuration, parsed from the options string passed with
//! `-agentpath:<lib>=<options>` or a dynamic attach.
//!
//! Options are comma-separated `key=value` pairs:
//!
//! ```text
//! -agentpath:/path/to/libanchor_agent.so=log=debug
//! ```

use tracing_subscriber::EnvFilter;

use crate::error::{AgentError, AgentResult};

/// Filter used when no `log=` option is given
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Agent settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// `tracing` filter directive for diagnostics written to stderr.
    /// Default: `warn`
    pub log_filter: String,

    /// Option keys that were not recognized
    pub ignored: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            ignored: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an agent options string. `None` or blank yields the defaults.
    pub fn parse(options: Option<&str>) -> AgentResult<Self> {
        let mut config = Self::default();
        let Some(options) = options else {
            return Ok(config);
        };

        for pair in options.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| AgentError::InvalidOptions(format!("expected key=value, got `{pair}`")))?;

            match key.trim() {
                "log" => {
                    let value = value.trim();
                    EnvFilter::try_new(value).map_err(|err| {
                        AgentError::InvalidOptions(format!("bad log filter `{value}`: {err}"))
                    })?;
                    config.log_filter = value.to_string();
                }
                other => config.ignored.push(other.to_string()),
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(AgentConfig::parse(None).unwrap(), AgentConfig::default());
        assert_eq!(AgentConfig::parse(Some("")).unwrap(), AgentConfig::default());
        assert_eq!(AgentConfig::parse(Some(" , ")).unwrap(), AgentConfig::default());
        assert_eq!(AgentConfig::new().log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_log_filter() {
        let config = AgentConfig::parse(Some("log=debug")).unwrap();
        assert_eq!(config.log_filter, "debug");
        assert!(config.ignored.is_empty());

        let config = AgentConfig::parse(Some("log=anchor=trace")).unwrap();
        assert_eq!(config.log_filter, "anchor=trace");
    }

    #[test]
    fn test_unknown_keys_are_kept_aside() {
        let config = AgentConfig::parse(Some("log=info, verbose=1,x=")).unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.ignored, vec!["verbose".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_malformed_options() {
        let err = AgentConfig::parse(Some("log")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidOptions(_)));

        let err = AgentConfig::parse(Some("log=anchor=loud")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidOptions(_)));
    }
}
