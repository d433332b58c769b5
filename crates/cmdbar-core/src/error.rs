use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CmdbarError {
    Io(io::Error),
    Json(serde_json::Error),
    DatabaseNotFound(String),
    RunInProgress,
    Terminal(String),
    Clipboard(String),
    NotFound(String),
    AmbiguousId(String),
    Other(String),
}

impl fmt::Display for CmdbarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmdbarError::Io(err) => write!(f, "I/O error: {}", err),
            CmdbarError::Json(err) => write!(f, "JSON error: {}", err),
            CmdbarError::DatabaseNotFound(path) => write!(f, "Database not found at: {}", path),
            CmdbarError::RunInProgress => write!(f, "A command is already running"),
            CmdbarError::Terminal(msg) => write!(f, "Terminal launch error: {}", msg),
            CmdbarError::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),
            CmdbarError::NotFound(what) => write!(f, "No snippet matching '{}'", what),
            CmdbarError::AmbiguousId(prefix) => {
                write!(f, "Id prefix '{}' matches more than one snippet", prefix)
            }
            CmdbarError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CmdbarError {}

impl From<io::Error> for CmdbarError {
    fn from(err: io::Error) -> Self {
        CmdbarError::Io(err)
    }
}

impl From<serde_json::Error> for CmdbarError {
    fn from(err: serde_json::Error) -> Self {
        CmdbarError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, CmdbarError>;
