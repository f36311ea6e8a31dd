//! Error types for catalog loading and configuration.

use thiserror::Error;

/// Errors raised while fetching, parsing or configuring a star map.
///
/// Data problems inside an otherwise readable catalog (sparse rows, malformed
/// optional fields) are never errors; they are filtered or surface as absent
/// values. Only I/O, transport and configuration failures reach this type.
#[derive(Debug, Error)]
pub enum StarmapError {
    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure (connection, timeout, client construction).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("Failed to fetch {url}, status: {status}")]
    HttpStatus { url: String, status: u16 },

    /// The catalog text could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(String),

    /// The catalog text has no header row.
    #[error("Catalog has no header row")]
    MissingHeader,

    /// All fetch attempts failed; carries the last underlying failure.
    #[error("Catalog fetch failed after {attempts} attempts: {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },

    /// The background loader stopped without delivering a result.
    #[error("Catalog loader exited without a result")]
    LoaderExited,

    /// Invalid or unreadable viewer configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for StarmapError {
    fn from(e: csv::Error) -> Self {
        StarmapError::Csv(e.to_string())
    }
}

impl From<reqwest::Error> for StarmapError {
    fn from(e: reqwest::Error) -> Self {
        StarmapError::Http(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StarmapError>;
