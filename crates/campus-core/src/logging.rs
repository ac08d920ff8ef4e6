use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Controls where structured logs are published.
#[derive(Debug, Clone, Copy)]
pub enum LogDestination {
    /// Persistent JSON file plus human-readable stderr (the server).
    FileAndStderr,
    /// Stderr only (the CLI and tests).
    StderrOnly,
}

#[derive(Debug)]
struct LoggingGuards {
    _guard: Option<WorkerGuard>,
    log_path: Option<PathBuf>,
}

static LOGGING_STATE: OnceLock<LoggingGuards> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global logging subscriber.
///
/// The first call wins; subsequent calls are no-ops that return the resolved
/// log file path.
pub fn init_logging(destination: LogDestination) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let guards = install_logging(destination)?;
        if let Err(guards) = LOGGING_STATE.set(guards) {
            drop(guards);
        }
    }

    Ok(LOGGING_STATE
        .get()
        .and_then(|guards| guards.log_path.as_ref()))
}

fn install_logging(destination: LogDestination) -> Result<LoggingGuards, LoggingError> {
    let filter = build_filter()?;

    match destination {
        LogDestination::FileAndStderr => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_target(true)
                .with_writer(io::stderr)
                .with_ansi(false);

            let dir = log_directory();
            fs::create_dir_all(&dir)?;
            let path = dir.join("campus.log");
            let file_appender = tracing_appender::rolling::never(&dir, "campus.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_target(true)
                .with_writer(writer)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(stderr_layer)
                .try_init()?;

            info!(path = %path.display(), "structured logging enabled");
            Ok(LoggingGuards {
                _guard: Some(guard),
                log_path: Some(path),
            })
        }
        LogDestination::StderrOnly => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_target(true)
                .with_writer(io::stderr)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(LoggingGuards {
                _guard: None,
                log_path: None,
            })
        }
    }
}

fn log_directory() -> PathBuf {
    match env::var("CAMPUS_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim().to_string()),
        _ => PathBuf::from("logs"),
    }
}

fn build_filter() -> Result<EnvFilter, ParseError> {
    if let Ok(spec) = env::var("CAMPUS_LOG") {
        if !spec.trim().is_empty() {
            return EnvFilter::try_new(spec);
        }
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new("info"),
    }
}
