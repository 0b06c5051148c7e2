use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global JSON subscriber on stderr.
///
/// `RUST_LOG` wins when set. Otherwise quiet mode shows warnings and
/// errors only, and verbose mode shows info.
pub fn init_logging(quiet: bool) {
    let default_directive = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false);

    // try_init: a second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
