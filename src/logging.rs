use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Console logging to stderr, plus a daily-rolled JSON file under
/// `config.dir` unless file logging is off.
///
/// Stdout is left to command output (`search --json`). `RUST_LOG` overrides
/// `config.filter`. Hold the returned guard until exit so the file writer
/// flushes.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let (file_layer, guard) = match file_writer(config) {
        Some((writer, guard)) => (Some(fmt::layer().json().with_writer(writer)), Some(guard)),
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        eprintln!("A tracing subscriber was already installed; keeping it");
    }
    guard
}

fn file_writer(
    config: &LoggingConfig,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !config.file {
        return None;
    }
    if let Err(e) = fs::create_dir_all(&config.dir) {
        eprintln!("File logging disabled, cannot create '{}': {}", config.dir, e);
        return None;
    }
    let appender = tracing_appender::rolling::daily(&config.dir, "artist_finder.log");
    Some(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_can_be_disabled() {
        let config = LoggingConfig {
            file: false,
            ..LoggingConfig::default()
        };
        assert!(file_writer(&config).is_none());
    }

    #[test]
    fn test_log_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: dir.path().join("nested").display().to_string(),
            ..LoggingConfig::default()
        };
        assert!(file_writer(&config).is_some());
        assert!(dir.path().join("nested").is_dir());
    }
}
