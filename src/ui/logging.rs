//! ui::logging
//!
//! Structured diagnostics on stderr via `tracing`.
//!
//! The default level is `warn`; `--debug` raises stackpick's own events to
//! `debug`. `STACKPICK_LOG` takes an env-filter directive and overrides both.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "STACKPICK_LOG";

/// Default filter directive for the given debug flag.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "warn,stackpick=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool) {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_directive(debug)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init();
}
