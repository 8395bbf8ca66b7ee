use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{Config, LogLevel};

/// Keeps the non-blocking file writer alive for the process lifetime.
/// Dropping this flushes and closes the appender, so the caller must hold
/// it in `main` for as long as logging is wanted.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global `tracing` subscriber: always a compact stderr layer,
/// plus a daily-rotating file layer when `config.log_dir` is set. Also
/// installs a panic hook that routes panic messages through `tracing::error`
/// so they land in the same sink as everything else instead of only going
/// to stderr.
pub fn init(config: &Config) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));

    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let (file_layer, file_guard) = match &config.log_dir {
        Some(dir) => {
            let (appender, guard) = build_file_appender(dir, config.log_max_count);
            let layer = fmt::layer().with_ansi(false).with_writer(appender);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    subscriber
        .try_init()
        .expect("global tracing subscriber must only be installed once");

    install_panic_hook();

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn build_file_appender(dir: &Path, max_count: u32) -> (RollingFileAppender, WorkerGuard) {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix("podbridge")
        .filename_suffix("log")
        .max_log_files(max_count as usize)
        .build(dir)
        .unwrap_or_else(|_| RollingFileAppender::new(Rotation::DAILY, dir, "podbridge.log"));
    tracing_appender::non_blocking(appender)
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panicked");
        previous(info);
    }));
}

/// Converts a validated `LogLevel` into the `tracing::Level` used by call
/// sites that need a typed level rather than a filter string.
pub fn as_tracing_level(level: LogLevel) -> tracing::Level {
    match level {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warning => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::All => tracing::Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping_round_trips_ordering() {
        assert!(as_tracing_level(LogLevel::Error) < as_tracing_level(LogLevel::All));
        assert!(as_tracing_level(LogLevel::Info) < as_tracing_level(LogLevel::Debug));
    }
}
