//! Structured logging setup
//!
//! Installs a global `tracing` subscriber writing to stdout, either
//! human-readable or JSON. `RUST_LOG` takes precedence over the configured
//! level.

use sessionward_domain::{LogFormat, LoggingConfig, Result, SessionwardError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the level filter for `config`
///
/// # Errors
/// Returns `SessionwardError::Config` if the configured directive is invalid
/// and `RUST_LOG` is not set.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level).map_err(|e| {
            SessionwardError::Config(format!("Invalid log level '{}': {e}", config.level))
        })
    })
}

/// Initialize the global subscriber
///
/// Returns `Ok(false)` if a global subscriber was already installed, so
/// calling this more than once (tests, embedding hosts) is harmless.
///
/// # Errors
/// Returns `SessionwardError::Config` for an invalid level directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .try_init(),
        LogFormat::Pretty => {
            registry.with(fmt::layer().with_target(true).with_level(true)).try_init()
        }
    };

    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_level_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { level: "sessionward=[".into(), format: LogFormat::Pretty };

        assert!(matches!(env_filter(&config), Err(SessionwardError::Config(_))));
    }

    #[test]
    fn second_init_is_harmless() {
        let config = LoggingConfig { level: "debug".into(), format: LogFormat::Json };

        let _ = init_tracing(&config);
        assert!(!init_tracing(&config).unwrap());
    }
}
