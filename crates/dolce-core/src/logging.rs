//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `DOLCE_LOG=debug` or
/// `DOLCE_LOG=_dolce_core::verify=debug,warn`.
pub const LOG_ENV: &str = "DOLCE_LOG";

const DEFAULT_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Install the stderr fmt subscriber once per process.
///
/// Leaves an already installed global subscriber in place (for instance one
/// set up by an embedding host).
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}
