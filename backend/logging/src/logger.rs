//! Diagnostic logger for the host process.
//!
//! This is operator-facing `tracing` output, separate from the audit store.
//! Audit entries only show up here when `mirror_to_tracing` is on.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for the rolling diagnostic log.
pub const LOG_FILE_NAME: &str = "uarwatch.log";

/// Install the global subscriber: an ANSI console layer on stderr plus, when
/// `log_dir` is given, a daily-rolled NDJSON file `uarwatch.log.YYYY-MM-DD`.
///
/// `RUST_LOG` wins over `level`. Calling this twice is harmless.
pub fn init_logger<P: AsRef<Path>>(log_dir: Option<P>, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
            .boxed()
    });

    // stdout carries command output (stats, exports)
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
