use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from `verbosity`.
/// Logs go to the systemd journal when `journald` is set and the journal is
/// reachable, to stderr otherwise.
pub fn init(verbosity: u8, journald: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(level(verbosity).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);

    let journald_err = if journald {
        match tracing_journald::layer() {
            Ok(layer) => {
                registry.with(layer).init();
                return;
            }
            Err(e) => Some(e),
        }
    } else {
        None
    };

    registry
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();

    if let Some(e) = journald_err {
        tracing::warn!("journald unavailable, logging to stderr: {e}");
    }
}

fn level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
