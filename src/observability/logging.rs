//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binaries
//! - Pick the log level from the environment or the `--debug` flag
//!
//! # Design Decisions
//! - Logs go to stderr; stdout carries the glyph or JSON output
//! - Quiet by default (`warn`) since the binaries run on every status redraw

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "NERD_ICONS_LOG";

/// Filter used when `LOG_ENV` is unset or invalid.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "nerd_icons=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new(default_directive(true))
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_directive(false).into())
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).ends_with("=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
    }
}
