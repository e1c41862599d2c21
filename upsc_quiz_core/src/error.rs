//! Crate-wide error type

use std::fmt;

/// Errors that escape a component boundary.
///
/// Generation and PDF extraction never produce one of these; they degrade to
/// empty results instead. Storage writes and malformed persistent files do.
#[derive(Debug)]
pub enum QuizError {
    /// Filesystem failure while reading or writing bank, cache or result files.
    Io(std::io::Error),

    /// A bank or import file that exists but is not valid JSON for its shape.
    Json(serde_json::Error),

    /// SQLite failure in the result store.
    Database(rusqlite::Error),

    /// CSV read/write failure (result files, conversion output).
    Csv(csv::Error),

    /// Spreadsheet that could not be opened or read.
    Spreadsheet(String),

    /// Caller supplied something the operation cannot work with.
    InvalidInput(String),
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::Io(e) => write!(f, "I/O error: {}", e),
            QuizError::Json(e) => write!(f, "JSON error: {}", e),
            QuizError::Database(e) => write!(f, "database error: {}", e),
            QuizError::Csv(e) => write!(f, "CSV error: {}", e),
            QuizError::Spreadsheet(msg) => write!(f, "spreadsheet error: {}", msg),
            QuizError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuizError::Io(e) => Some(e),
            QuizError::Json(e) => Some(e),
            QuizError::Database(e) => Some(e),
            QuizError::Csv(e) => Some(e),
            QuizError::Spreadsheet(_) | QuizError::InvalidInput(_) => None,
        }
    }
}

impl From<std::io::Error> for QuizError {
    fn from(err: std::io::Error) -> Self {
        QuizError::Io(err)
    }
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        QuizError::Json(err)
    }
}

/// Allows using `?` on rusqlite calls.
impl From<rusqlite::Error> for QuizError {
    fn from(err: rusqlite::Error) -> Self {
        QuizError::Database(err)
    }
}

impl From<csv::Error> for QuizError {
    fn from(err: csv::Error) -> Self {
        QuizError::Csv(err)
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;

#[cfg(feature = "python")]
impl From<QuizError> for pyo3::PyErr {
    fn from(err: QuizError) -> Self {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
