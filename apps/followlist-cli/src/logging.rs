//! Diagnostic logging setup using tracing.
//!
//! Diagnostics go to stderr so stdout stays clean for `--json` and
//! `--handles` output. The filter comes from `FOLLOWLIST_LOG`, then
//! `RUST_LOG`, then the `-v` count.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "FOLLOWLIST_LOG";

/// Default filter directive for a verbosity count
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,followlist_cli=info,followlist_core=info",
        _ => "debug,hyper=info,reqwest=info,rustls=info",
    }
}

/// Build the filter from the environment, falling back to `verbosity`.
pub fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)))
}

/// Initialize the tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbosity: u8, json: bool) {
    let filter = build_filter(verbosity);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(verbosity, json, "Logging initialized");
    }
}

/// Initialize logging for tests (with simpler output).
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_by_verbosity() {
        assert_eq!(default_filter(0), "warn");
        assert!(default_filter(1).starts_with("info"));
        assert!(default_filter(2).starts_with("debug"));
        assert_eq!(default_filter(7), default_filter(2));
    }

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging(0, false);
        init_logging(2, true);
    }
}
