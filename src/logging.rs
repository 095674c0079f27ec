//! Logging setup for programs driving a [`crate::MemorySpace`].
//!
//! The allocator emits `tracing` events under the `memspace::space`,
//! `memspace::compact` and `memspace::list` targets. Allocations and releases
//! are logged at `TRACE`, failed allocations and compactions at `DEBUG`, and
//! releases of unknown addresses at `WARN`.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG`, debug builds log `memspace=debug` and release builds
/// `memspace=info`. Calling this more than once is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            EnvFilter::new("memspace=debug")
        }
        #[cfg(not(debug_assertions))]
        {
            EnvFilter::new("memspace=info")
        }
    });

    // A subscriber may already be installed.
    fmt().with_env_filter(filter).compact().try_init().ok();
}
