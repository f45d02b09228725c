//! Structured logging setup.
//!
//! All crates log through `tracing` macros with structured fields. The binary
//! calls [`init_subscriber`] once at startup; library code never installs a
//! subscriber itself.

use tracing_subscriber::EnvFilter;

/// Default filter when neither the caller nor `RUST_LOG` specifies one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level`. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails if a global default is already set
    let _ = subscriber.try_init();
}
