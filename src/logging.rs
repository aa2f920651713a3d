//! Tracing setup for embedders and tests.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize a tracing subscriber for revkeep's logs.
///
/// Log level is controlled by:
/// 1. `debug = true` sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Calling this more than once, or after the host installed its own
/// subscriber, leaves the existing subscriber in place.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("revkeep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("revkeep=info"))
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}
