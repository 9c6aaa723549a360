// errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Library source error: {0}")]
    SourceFailed(String),

    #[error("Library parsing error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
