//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Filter used when `BENCHTRAIL_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str =
    "warn,benchtrail_core=info,benchtrail_storage=info,benchtrail_bench=info,benchtrail=info";

/// Initialize the benchtrail tracing/logging system.
///
/// Reads `BENCHTRAIL_LOG` for per-crate log levels.
/// Format: `BENCHTRAIL_LOG=benchtrail_bench=debug,benchtrail_storage=warn`
///
/// Events go to stderr: a historical child's stdout stays free for its
/// own output and the parent captures both streams for diagnostics.
///
/// Idempotent; calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
