//! Tracing bootstrap for tests.

use once_cell::sync::Lazy;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Another harness may already own the global subscriber.
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
});

/// Install a test-writer subscriber once per process; `RUST_LOG` overrides the `warn` default.
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
