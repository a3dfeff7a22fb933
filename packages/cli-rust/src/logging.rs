//! Logging setup
//!
//! Routes `tracing` output to stderr, filtered by `RUST_LOG` or the
//! verbosity flags.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directive for the given verbosity
///
/// 0 = warnings only, 1 (-v) = debug, 2+ (-vv) = trace.
/// `quiet` drops to errors.
pub fn filter_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8, quiet: bool) {
    // RUST_LOG wins over the flags
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity, quiet)));

    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .init();
}
