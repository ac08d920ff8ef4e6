use std::io;

use thiserror::Error;

/// Unified error type for the extraction pipeline.
///
/// Table-read and authentication failures are pipeline-fatal; everything else
/// is recorded per row and processing continues.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Table(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl ScheduleError {
    pub fn message<T: Into<String>>(message: T) -> Self {
        ScheduleError::Message(message.into())
    }

    /// Stable label identifying the error class, independent of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::Message(_) => "Error",
            ScheduleError::Config(_) => "ConfigError",
            ScheduleError::Table(_) => "TableError",
            ScheduleError::Auth(_) => "AuthError",
            ScheduleError::Io(_) => "IoError",
            ScheduleError::Http(_) => "HttpError",
            ScheduleError::Json(_) => "JsonError",
        }
    }

    /// Formats the `<Kind>: <message>` string stored in per-row error records.
    pub fn marker(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
