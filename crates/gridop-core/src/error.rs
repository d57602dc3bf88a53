//! Unified error types for the gridop ecosystem
//!
//! This module provides a common error type [`GridopError`] that can represent
//! errors from any part of the pipeline. Domain-specific error types can be
//! converted to `GridopError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all gridop operations.
///
/// Allows errors from I/O, parsing, solving, and validation to be handled
/// uniformly at crate boundaries.
#[derive(Error, Debug)]
pub enum GridopError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GridopError.
pub type GridopResult<T> = Result<T, GridopError>;

impl From<serde_json::Error> for GridopError {
    fn from(err: serde_json::Error) -> Self {
        GridopError::Parse(err.to_string())
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for GridopError {
    fn from(err: anyhow::Error) -> Self {
        GridopError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for GridopError {
    fn from(s: String) -> Self {
        GridopError::Other(s)
    }
}

impl From<&str> for GridopError {
    fn from(s: &str) -> Self {
        GridopError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridopError::Solver("dispatch infeasible".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("dispatch infeasible"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GridopError = io_err.into();
        assert!(matches!(err, GridopError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: GridopError = json_err.into();
        assert!(matches!(err, GridopError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GridopResult<()> {
            Err(GridopError::Validation("test".into()))
        }

        fn outer() -> GridopResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
