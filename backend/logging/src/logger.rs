use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the background file writer alive; drop it on shutdown to flush.
pub struct LoggerGuard {
    _file: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `level`. The file layer writes NDJSON to
/// `<log_dir>/codebuddy.log.YYYY-MM-DD`; the console layer only shows
/// warnings and errors so it does not trample the interactive prompt.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> LoggerGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "codebuddy.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    LoggerGuard { _file: guard }
}
