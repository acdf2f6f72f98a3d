//! Test Tracing Setup
//!
//! Installs a tracing subscriber wired to the test writer so emitter and
//! worker logs land in the captured test output instead of stderr.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initializes tracing for a test binary
///
/// Safe to call from every test; only the first call installs the
/// subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
