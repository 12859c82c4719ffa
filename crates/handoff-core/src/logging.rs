// Purpose: tracing subscriber setup shared by the native library and the demo binary

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{HandoffError, HandoffResult};

//-----------------------------------------------------------------------------
// Tracing Initialization
//-----------------------------------------------------------------------------

/// Parse a filter directive such as `"info"` or `"handoff_ffi=debug,warn"`
pub fn parse_filter(directive: &str) -> HandoffResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| HandoffError::config(format!("invalid log filter {:?}: {}", directive, e)))
}

/// Installs the global tracing subscriber.
///
/// Events go to stderr so they never mix with a host's stdout.
/// `RUST_LOG` wins over `config.level` when it is set. Fails if a global
/// subscriber is already installed or the filter directive does not parse.
pub fn init_tracing(config: &LoggingConfig) -> HandoffResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.level)?,
    };

    let subscriber = Registry::default().with(env_filter);

    let installed = if config.json {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))
    };

    installed.map_err(|e| HandoffError::config(format!("tracing already initialized: {}", e)))
}

static TEST_INIT: Once = Once::new();

/// Initialize debug-level logging routed through the test writer (once per test binary)
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_test_writer();
        let _ = tracing::subscriber::set_global_default(
            Registry::default().with(env_filter).with(fmt_layer),
        );
    });
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        init_test_logging();
        tracing::debug!("test logging initialized");

        let err = init_tracing(&LoggingConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "HANDOFF_CONFIG");
    }

    #[test]
    fn test_parse_filter() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("handoff_ffi=debug,warn").is_ok());

        let err = parse_filter("handoff=notalevel").unwrap_err();
        assert!(err.to_string().contains("handoff=notalevel"));
    }
}
