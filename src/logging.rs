/// Logging setup
///
/// Diagnostics go to stderr through tracing so they never mix with command
/// output. `HOURGLASS_LOG` takes an `EnvFilter` directive and wins over the
/// verbosity flag.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "HOURGLASS_LOG";

/// Default filter for a given number of `-v` flags
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
