use thiserror::Error;

/// Errors from the persistence and export collaborators.
/// The timer and statistics core never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown event `{0}` (see --list-events)")]
    UnknownEvent(String),

    #[error("invalid session id `{0}` (use letters, digits, `-` and `_`)")]
    InvalidSessionId(String),

    #[error("no state directory available")]
    NoStateDir,
}

pub type Result<T> = std::result::Result<T, Error>;
